//! Schema Model CLI
//!
//! Inspects and edits JSON Schema files through the pointer-addressed model.
//!
//! Usage:
//!   schema-model check schema.json
//!   schema-model add-field schema.json --parent '#' --name email
//!   schema-model promote schema.json '#/properties/address' -o out.json
//!   schema-model cycles schema.json

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schema_model::config::OutputFormat;
use schema_model::model::SchemaModel;
use schema_model::pointer::{change_name_in_pointer, ROOT_POINTER};
use schema_model::wire::check_json_schema;
use schema_model::{
    CombinationKind, DefinitionGraph, FieldType, ModelConfig, NodeKind, NodePosition,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-model")]
#[command(about = "Inspect and edit JSON Schema documents")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the resulting schema here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the model built from a schema
    Check {
        schema: PathBuf,
    },

    /// Parse and serialize a schema, reporting whether it survives unchanged
    Roundtrip {
        schema: PathBuf,
    },

    /// Print the node tree
    Tree {
        schema: PathBuf,
    },

    /// Add a field, or a combination with --combination
    AddField {
        schema: PathBuf,
        /// Parent pointer
        #[arg(short, long, default_value = ROOT_POINTER)]
        parent: String,
        /// Property name (ignored inside combinations)
        #[arg(short, long)]
        name: Option<String>,
        /// Field type (defaults to editor.default_field_type)
        #[arg(short = 't', long = "type")]
        field_type: Option<FieldType>,
        /// Add a combination instead of a field
        #[arg(long)]
        combination: Option<Option<CombinationKind>>,
        /// Position among the parent's children (appends when omitted)
        #[arg(short, long)]
        index: Option<isize>,
    },

    /// Add an empty object definition
    AddDefinition {
        schema: PathBuf,
        /// Definition name (generated from editor.definition_prefix when omitted)
        name: Option<String>,
    },

    /// Turn a subtree into a definition and reference it in place
    Promote {
        schema: PathBuf,
        pointer: String,
    },

    /// Rename a property
    Rename {
        schema: PathBuf,
        pointer: String,
        name: String,
    },

    /// Move a node under another parent or to another position
    Move {
        schema: PathBuf,
        pointer: String,
        #[arg(short, long)]
        parent: String,
        #[arg(short, long)]
        index: Option<isize>,
    },

    /// Delete a node and its subtree
    Delete {
        schema: PathBuf,
        pointer: String,
    },

    /// List definition reference cycles
    Cycles {
        schema: PathBuf,
    },

    /// List definitions that nothing in the document uses
    Unused {
        schema: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ModelConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Check { schema } => {
            let model = load_model(&schema, &config)?;
            let diagnostics = model.validate();
            if diagnostics.is_empty() {
                println!("✅ {} nodes, no problems", model.node_map().len());
                return Ok(());
            }
            print!("{}", diagnostics.format_all());
            println!(
                "{} errors, {} warnings",
                diagnostics.error_count(),
                diagnostics.warning_count()
            );
            if diagnostics.has_errors() {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Roundtrip { schema } => {
            let original = read_schema(&schema)?;
            let model = load_model(&schema, &config)?;
            let rebuilt = model.to_wire()?;
            if rebuilt == original {
                eprintln!("✅ round trip is lossless");
            } else {
                eprintln!("⚠️  round trip changed the document");
            }
            write_schema(&rebuilt, output, config.output.format)
        }

        Commands::Tree { schema } => {
            let model = load_model(&schema, &config)?;
            print_tree(&model, ROOT_POINTER, 0)
        }

        Commands::AddField {
            schema,
            parent,
            name,
            field_type,
            combination,
            index,
        } => {
            let target = match index {
                Some(index) => NodePosition::new(parent, index),
                None => NodePosition::append(parent),
            };
            edit(&schema, &config, output, |model| {
                let node = match combination {
                    Some(kind) => model.add_combination(
                        name.as_deref(),
                        target,
                        kind.unwrap_or(config.editor.default_combination_kind),
                    )?,
                    None => model.add_field(
                        name.as_deref(),
                        field_type.unwrap_or(config.editor.default_field_type),
                        target,
                    )?,
                };
                info!(pointer = %node.pointer, "added node");
                Ok(())
            })
        }

        Commands::AddDefinition { schema, name } => edit(&schema, &config, output, |model| {
            let name = match name {
                Some(name) => name,
                None => model.generate_unique_definition_name(&config.editor.definition_prefix)?,
            };
            let node = model.add_field_type(&name)?;
            info!(pointer = %node.pointer, "added definition");
            Ok(())
        }),

        Commands::Promote { schema, pointer } => edit(&schema, &config, output, |model| {
            model.convert_to_definition(&pointer)?;
            Ok(())
        }),

        Commands::Rename {
            schema,
            pointer,
            name,
        } => edit(&schema, &config, output, |model| {
            let mut node = model.get_node(&pointer)?.clone();
            node.pointer = change_name_in_pointer(&pointer, &name).into();
            model.update_node(&pointer, node)?;
            Ok(())
        }),

        Commands::Move {
            schema,
            pointer,
            parent,
            index,
        } => {
            let target = match index {
                Some(index) => NodePosition::new(parent, index),
                None => NodePosition::append(parent),
            };
            edit(&schema, &config, output, |model| {
                let node = model.move_node(&pointer, target)?;
                info!(from = %pointer, to = %node.pointer, "moved node");
                Ok(())
            })
        }

        Commands::Delete { schema, pointer } => edit(&schema, &config, output, |model| {
            model.delete_node(&pointer)?;
            Ok(())
        }),

        Commands::Cycles { schema } => {
            let model = load_model(&schema, &config)?;
            let cycles = DefinitionGraph::build(&model).cycles();
            if cycles.is_empty() {
                println!("✅ No definition cycles");
                return Ok(());
            }
            for cycle in &cycles {
                let members: Vec<&str> = cycle.iter().map(|p| p.as_str()).collect();
                println!("❌ {}", members.join(" → "));
            }
            std::process::exit(1);
        }

        Commands::Unused { schema } => {
            let model = load_model(&schema, &config)?;
            for definition in DefinitionGraph::build(&model).unused_definitions() {
                println!("{}", definition);
            }
            Ok(())
        }
    }
}

fn read_schema(path: &Path) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_model(path: &Path, config: &ModelConfig) -> Result<SchemaModel> {
    let schema = read_schema(path)?;
    if config.validation.strict_json_schema {
        check_json_schema(&schema)?;
    }
    let model = SchemaModel::from_wire(&schema)?;
    info!(path = %path.display(), nodes = model.node_map().len(), "loaded schema");
    Ok(model)
}

fn write_schema(schema: &Value, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let content = format.render(schema)?;
    match output {
        Some(path) => std::fs::write(path, content + "\n")
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

/// Apply `change` to a copy of the model and write it out if it succeeds
fn edit<F>(path: &Path, config: &ModelConfig, output: Option<&Path>, change: F) -> Result<()>
where
    F: FnOnce(&mut SchemaModel) -> schema_model::Result<()>,
{
    let model = load_model(path, config)?;
    let mut draft = model.deep_clone();
    change(&mut draft)?;

    if config.validation.check_invariants {
        let diagnostics = draft.validate();
        if diagnostics.has_errors() {
            bail!("edit broke the model:\n{}", diagnostics.format_all());
        }
    }
    write_schema(&draft.to_wire()?, output, config.output.format)
}

fn print_tree(model: &SchemaModel, pointer: &str, depth: usize) -> Result<()> {
    let node = model.get_node(pointer)?;
    let label = match &node.kind {
        NodeKind::Field { field_type, .. } => field_type.to_string(),
        NodeKind::Combination {
            combination_type, ..
        } => combination_type.to_string(),
        NodeKind::Reference { reference } => format!("→ {}", reference),
    };
    let array = if node.is_array { "[]" } else { "" };
    let required = if node.is_required { " *" } else { "" };
    println!(
        "{}{} ({}{}){}",
        "  ".repeat(depth),
        node.pointer,
        label,
        array,
        required
    );
    for child in node.children() {
        print_tree(model, child.as_str(), depth + 1)?;
    }
    Ok(())
}
