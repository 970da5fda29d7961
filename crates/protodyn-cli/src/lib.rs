//! protodyn application library.
//!
//! Wires configuration, logging, sample fixtures and the emit/parse
//! pipelines behind the `protodyn` binary. Also used directly by the
//! integration tests.

pub mod cli;
pub mod config;
pub mod fixtures;
pub mod obs;
pub mod pipeline;

use cli::{Cli, Commands};
use config::ProtodynConfig;
use pipeline::emit::EmitRequest;
use pipeline::parse::ParseRequest;
use pipeline::PipelineError;

/// Execute one parsed command line.
pub fn run(cli: &Cli, cfg: &ProtodynConfig) -> Result<(), PipelineError> {
    match &cli.command {
        Commands::Emit(args) => {
            let _span = tracing::info_span!("emit", shape = args.shape.name()).entered();
            pipeline::emit::run(&EmitRequest {
                shape: args.shape,
                path: &args.path,
                schema_uri: args.schema_uri.as_deref(),
                raw: args.raw,
            })
        }
        Commands::Parse(args) => {
            let _span = tracing::info_span!("parse", raw = args.raw, use_static = args.use_static)
                .entered();
            let naming = cfg.naming();
            pipeline::parse::run(&ParseRequest {
                source_path: &args.source_path,
                schema_uri: args.schema_uri.as_deref(),
                raw: args.raw,
                use_static: args.use_static,
                type_name: args.type_name.as_deref(),
                target_path: args.target_path.as_deref(),
                naming: &naming,
                pretty: cfg.output.pretty,
            })
        }
        Commands::Schema(args) => {
            let _span = tracing::info_span!("schema").entered();
            pipeline::export::run(&args.path)
        }
    }
}
