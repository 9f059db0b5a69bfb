use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zipfs")]
#[command(version)]
#[command(about = "Browse paths inside zip archives as if they were extracted", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfs ls vendor/pkg.zip            list the root of pkg.zip\n  \
  zipfs ls vendor/pkg.zip/src        list a directory inside pkg.zip\n  \
  zipfs cat vendor/pkg.zip/README.md  print a file inside pkg.zip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Resolve relative paths against DIR instead of the current directory
    #[arg(long, value_name = "DIR", global = true)]
    pub cwd: Option<String>,

    /// Print archive cache statistics to stderr when done
    #[arg(long, global = true)]
    pub stats: bool,

    /// Verbose logging (-vv => more verbose)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory
    Ls {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Print a file
    Cat {
        #[arg(value_name = "PATH", num_args = 1..)]
        paths: Vec<String>,
    },
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "zipfs=debug",
            _ => "trace",
        }
    }
}
