use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use refdump::typename::{
    parse_type_name, KnownTypes, RenderFlags, Renderer, ShortNames, TypeName, TypeNameParser,
};

use crate::{
    app::GlobalOptions,
    commands::common::load_dump,
    output::{print_output, TabWriter},
};

#[derive(Debug, Serialize)]
struct NodeOutput {
    rendered: String,
    namespace: String,
    name: String,
    is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    generic_param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enclosing: Option<Box<NodeOutput>>,
    generic_args: Vec<NodeOutput>,
}

impl NodeOutput {
    fn new(node: &TypeName, renderer: &Renderer) -> Self {
        NodeOutput {
            rendered: renderer.render(node),
            namespace: node.namespace.clone(),
            name: node.name.clone(),
            is_array: node.is_array,
            generic_param: node.generic_param.map(|param| param.to_string()),
            enclosing: node
                .enclosing
                .as_deref()
                .map(|enclosing| Box::new(NodeOutput::new(enclosing, renderer))),
            generic_args: node
                .generic_args
                .iter()
                .map(|arg| NodeOutput::new(arg, renderer))
                .collect(),
        }
    }
}

pub fn run(
    name: &str,
    dump: Option<&Path>,
    scope: Option<&str>,
    definition: bool,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let table = match dump {
        Some(path) => load_dump(path)?.name_table(),
        None => KnownTypes::new(),
    };

    let scope = scope
        .map(|scope| {
            parse_type_name(scope, &table, None)
                .with_context(|| format!("failed to parse scope type '{scope}'"))
        })
        .transpose()?;

    let node = TypeNameParser::new(&table)
        .with_containing(scope.as_ref())
        .definitions_only(definition)
        .parse(name)
        .with_context(|| format!("failed to parse '{name}'"))?;

    let short_names = ShortNames::new();
    let renderer = Renderer::new(RenderFlags::QUALIFIED).with_short_names(&short_names);
    let output = NodeOutput::new(&node, &renderer);

    print_output(&output, opts, |out| print_node(out, ""))
}

fn print_node(node: &NodeOutput, indent: &str) {
    let mut rows = vec![
        ("Type", node.rendered.clone()),
        ("Namespace", or_dash(&node.namespace)),
        ("Name", node.name.clone()),
        ("Array", (if node.is_array { "yes" } else { "no" }).to_string()),
    ];
    if let Some(param) = &node.generic_param {
        rows.push(("Unresolved", param.clone()));
    }
    if let Some(enclosing) = &node.enclosing {
        rows.push(("Enclosing", enclosing.rendered.clone()));
    }
    TabWriter::fields(&rows).indent(indent).print();

    let nested = format!("{indent}    ");
    for (i, arg) in node.generic_args.iter().enumerate() {
        println!("{indent}  Argument {i}:");
        print_node(arg, &nested);
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
