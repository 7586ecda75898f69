use std::path::Path;

use anyhow::{bail, Context};
use refdump::{
    dump::{summary::SummaryOptions, Dump},
    typename::{GlobalPrefix, RenderFlags, Renderer},
};

/// Load a reflection dump, with the path in the error context.
pub fn load_dump(path: &Path) -> anyhow::Result<Dump> {
    Dump::from_file(path).with_context(|| format!("failed to load dump: {}", path.display()))
}

/// Output style selected with `--style`.
pub struct Style {
    pub options: SummaryOptions,
    pub global_prefix: GlobalPrefix,
    pub flags: RenderFlags,
}

impl Style {
    pub fn parse(style: &str) -> anyhow::Result<Self> {
        match style {
            "csharp" => Ok(Style {
                options: SummaryOptions::csharp(),
                global_prefix: GlobalPrefix::csharp(),
                flags: RenderFlags::QUALIFIED | RenderFlags::GLOBAL_PREFIX,
            }),
            "plain" => Ok(Style {
                options: SummaryOptions::lua(),
                global_prefix: GlobalPrefix::default(),
                flags: RenderFlags::QUALIFIED,
            }),
            other => bail!("unknown style '{other}'; expected 'csharp' or 'plain'"),
        }
    }

    /// Renderer for type names in this style.
    pub fn renderer(&self) -> Renderer<'_> {
        Renderer::new(self.flags)
            .with_short_names(&self.options.short_names)
            .with_global_prefix(&self.global_prefix)
    }
}
