use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(version)]
pub struct Args {
    /// Include a device name or path
    #[clap(long, use_value_delimiter = true)]
    pub device: Vec<String>,
    /// Ignore a device name or path
    #[clap(long, use_value_delimiter = true)]
    pub ignore: Vec<String>,
    /// Override hold_threshold_millis of the config
    #[clap(long, value_name = "MILLIS")]
    pub hold_threshold_millis: Option<u64>,
    /// Generate shell completions
    ///
    /// You can use them by storing in your shells completion file or by running
    /// - in bash: eval "$(comboremap --completions bash)"
    /// - in fish: comboremap --completions fish | source
    #[clap(long, value_enum, display_order = 100, value_name = "SHELL", verbatim_doc_comment)]
    pub completions: Option<Shell>,
    /// Config file(s). The built-in Emacs-style rules are used if none is given.
    pub configs: Vec<PathBuf>,
}
