//! CLI entry: tokenizing, grammar resolution, and dispatch.

use crate::core::{config, file_store::FileCredentialStore, paths::StorePaths};
use crate::util::logging;
use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};

pub mod dispatch;
pub mod options;

use dispatch::CommandDispatcher;
use options::{OptionParser, RawOptions};

#[derive(Parser, Debug)]
#[command(
    name = "creds",
    version,
    about = "Manage entries in the per-user credential store",
    override_usage = "creds [-l|-s|-a|-d] [-g] [-t target] [-y type] [-p hexBlob] [target]",
    after_help = "With no switches, lists credentials; with a single target, shows it."
)]
pub struct Cli {
    #[command(flatten)]
    pub options: RawOptions,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let request = OptionParser::new(self.options).parse()?;

        let paths = StorePaths::resolve()?;
        let (cfg, config_warning) = config::load_or_default(&paths.config);
        logging::init(cfg.log.filter.as_deref());
        if let Some(w) = config_warning {
            warn!("{}", w);
        }
        debug!(store = %paths, "resolved store");

        let store = FileCredentialStore::new(paths);
        let stdout = std::io::stdout().lock();
        let mut dispatcher =
            CommandDispatcher::new(&store, stdout).with_journald_audit(cfg.audit.journald_audit);
        dispatcher.dispatch(&request)?;
        Ok(())
    }
}
