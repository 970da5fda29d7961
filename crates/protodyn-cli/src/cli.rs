//! Command-line surface of the `protodyn` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::fixtures::Shape;

/// Emit and parse protobuf payloads described by a descriptor set.
#[derive(Debug, Parser)]
#[command(name = "protodyn", version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// YAML config file (defaults to ./protodyn.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Encode a sample message and write it, wrapped in an envelope unless --raw.
    Emit(EmitArgs),
    /// Decode a payload and print its JSON projection.
    Parse(ParseArgs),
    /// Write the compiled-in sample schemas as a descriptor set.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Sample message to emit.
    #[arg(long = "type", value_enum)]
    pub shape: Shape,

    /// Output file.
    #[arg(long)]
    pub path: PathBuf,

    /// Descriptor-set URI recorded in the envelope's dataschema.
    #[arg(long, required_unless_present = "raw")]
    pub schema_uri: Option<String>,

    /// Write bare protobuf bytes instead of an envelope.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Input file.
    #[arg(long)]
    pub source_path: PathBuf,

    /// `<uri>#<Type>`; required with --raw, fallback for envelopes without dataschema.
    #[arg(long)]
    pub schema_uri: Option<String>,

    /// Input holds bare protobuf bytes.
    #[arg(long, requires = "schema_uri")]
    pub raw: bool,

    /// Resolve against the compiled-in sample schemas.
    #[arg(long = "static")]
    pub use_static: bool,

    /// Message type, overriding the schema reference fragment.
    #[arg(long = "type")]
    pub type_name: Option<String>,

    /// Output file (stdout when absent).
    #[arg(long)]
    pub target_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Output file.
    #[arg(long)]
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn emit_args() {
        let cli = Cli::try_parse_from([
            "protodyn",
            "-vv",
            "emit",
            "--type",
            "ComplexMessage",
            "--path",
            "out.json",
            "--schema-uri",
            "file:///schema.pb",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Emit(args) = cli.command else {
            panic!("expected emit");
        };
        assert_eq!(args.shape, Shape::ComplexMessage);
        assert_eq!(args.schema_uri.as_deref(), Some("file:///schema.pb"));
        assert!(!args.raw);
    }

    #[test]
    fn emit_raw_needs_no_schema_uri() {
        let cli =
            Cli::try_parse_from(["protodyn", "emit", "--type", "SimpleMessage", "--path", "o", "--raw"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Emit(EmitArgs { raw: true, .. })));
    }

    #[test]
    fn emit_wrapped_requires_schema_uri() {
        let err = Cli::try_parse_from(["protodyn", "emit", "--type", "SimpleMessage", "--path", "o"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let err = Cli::try_parse_from(["protodyn", "emit", "--type", "Nope", "--path", "o", "--raw"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn parse_defaults_to_wrapped_dynamic() {
        let cli = Cli::try_parse_from(["protodyn", "parse", "--source-path", "in.json"]).unwrap();
        let Commands::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert!(!args.raw);
        assert!(!args.use_static);
        assert!(args.schema_uri.is_none());
        assert!(args.target_path.is_none());
    }

    #[test]
    fn raw_parse_requires_schema_uri() {
        let err = Cli::try_parse_from(["protodyn", "parse", "--source-path", "in.pb", "--raw"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "protodyn",
            "schema",
            "--path",
            "schema.pb",
            "--config",
            "custom.yaml",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    }
}
