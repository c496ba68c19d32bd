use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "syncer", about = "Incremental synchronization of the delivery warehouse")]
pub struct Cli {
    #[command(subcommand)]
    pub job: Job,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Job {
    /// Create the staging and dimensional schemas if they don't exist.
    Schema,
    /// Copy an upstream collection into its staging table.
    Stage {
        #[arg(value_enum)]
        source: Source,
    },
    /// Load one stream from staging into the dimensional model.
    Load {
        #[arg(value_enum)]
        stream: StreamName,
    },
    /// Rebuild the courier ledger datamart from the delivery facts.
    Ledger,
}

/// Collections of the delivery system API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Couriers,
    Deliveries,
}

impl Source {
    pub fn collection(&self) -> &'static str {
        match self {
            Source::Couriers => "couriers",
            Source::Deliveries => "deliveries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamName {
    Couriers,
    Deliveries,
    Orders,
    DeliveryFacts,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_jobs() {
        let cli = Cli::try_parse_from(["syncer", "load", "delivery-facts"]).unwrap();
        assert_eq!(
            cli.job,
            Job::Load {
                stream: StreamName::DeliveryFacts
            }
        );

        let cli = Cli::try_parse_from(["syncer", "stage", "couriers"]).unwrap();
        assert_eq!(
            cli.job,
            Job::Stage {
                source: Source::Couriers
            }
        );

        let cli = Cli::try_parse_from(["syncer", "ledger"]).unwrap();
        assert_eq!(cli.job, Job::Ledger);

        assert!(Cli::try_parse_from(["syncer", "stage", "orders"]).is_err());
    }
}
