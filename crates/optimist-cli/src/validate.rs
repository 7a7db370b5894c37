//! # Config validation
//!
//! `optimist validate <path>` loads an [`OracleConfig`] and reports whether it
//! is usable. Exit code 0 when valid, 1 when not.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use optimist_oracle::OracleConfig;

/// Arguments for `optimist validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Oracle configuration file (YAML).
    pub path: PathBuf,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    match OracleConfig::from_yaml_file(&args.path) {
        Ok(config) => {
            tracing::info!(path = %args.path.display(), "configuration valid");
            println!("OK: {}", args.path.display());
            println!("  default liveness:   {}s", config.default_liveness_secs);
            println!("  bond percentage:    {}", config.default_bond_percentage);
            println!("  fee sink:           {}", config.fee_sink);
            println!("  max ancillary data: {} bytes", config.max_ancillary_data_len);
            for (currency, fee) in &config.final_fees {
                println!("  final fee {currency:<8} {fee}");
            }
            Ok(0)
        }
        Err(e) => {
            println!("INVALID: {}: {e}", args.path.display());
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn valid_config_exits_zero() {
        let file = write_temp(
            "fee_sink: \"0x00000000000000000000000000000000000000fe\"\n\
             final_fees:\n  USDC: \"10\"\n",
        );
        let args = ValidateArgs {
            path: file.path().to_path_buf(),
        };
        assert_eq!(run_validate(&args).unwrap(), 0);
    }

    #[test]
    fn invalid_liveness_exits_one() {
        let file = write_temp(
            "fee_sink: \"0x00000000000000000000000000000000000000fe\"\n\
             final_fees: {}\n\
             default_liveness_secs: 0\n",
        );
        let args = ValidateArgs {
            path: file.path().to_path_buf(),
        };
        assert_eq!(run_validate(&args).unwrap(), 1);
    }

    #[test]
    fn missing_file_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            path: dir.path().join("absent.yaml"),
        };
        assert_eq!(run_validate(&args).unwrap(), 1);
    }
}
