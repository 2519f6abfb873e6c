//! CLI definition for the `formkit` command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// formkit - declarative forms, custom fields and image normalization
#[derive(Parser, Debug)]
#[command(name = "formkit")]
#[command(version)]
#[command(about = "Validate, default and submit declarative forms")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Extra configuration file merged after the discovered ones
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a values document against a form
    Validate {
        /// Form descriptor document (YAML or JSON)
        form: PathBuf,
        /// Values document (YAML or JSON mapping)
        #[arg(long)]
        values: PathBuf,
    },
    /// Print the default values of a form
    Defaults {
        /// Form descriptor document (YAML or JSON)
        form: PathBuf,
        /// Initial values preferred over zero values
        #[arg(long)]
        initial: Option<PathBuf>,
    },
    /// Print field names grouped by section
    Sections {
        /// Form descriptor document (YAML or JSON)
        form: PathBuf,
    },
    /// Manage stored custom fields
    Custom {
        #[command(subcommand)]
        action: CustomAction,
    },
    /// Re-encode an image as a bounded JPEG
    NormalizeImage {
        input: PathBuf,
        output: PathBuf,
        /// Byte limit, defaults to the configured `image.max_bytes`
        #[arg(long)]
        max_bytes: Option<u64>,
        /// Longest edge in pixels, defaults to `image.max_dimension`
        #[arg(long)]
        max_dimension: Option<u32>,
    },
    /// Run the full engine and print the submission payload
    Submit {
        /// Form descriptor document with the built-in fields
        form: PathBuf,
        /// Entity type whose stored custom fields are merged in
        #[arg(long)]
        entity: String,
        /// Values document (YAML or JSON mapping)
        #[arg(long)]
        values: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum CustomAction {
    /// List custom fields of an entity type
    List { entity: String },
    /// Add every descriptor in a document as a custom field
    Add {
        entity: String,
        /// Descriptor document (YAML or JSON)
        descriptors: PathBuf,
    },
    /// Remove a custom field by name
    Remove { entity: String, name: String },
}
