//! CLI type definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_core::models::Language;
use folio_core::ResourceKey;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio content from the command line, cached for an hour", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Content language (en, uz, ru)
    #[arg(short, long, global = true)]
    pub lang: Option<Language>,

    /// Print raw JSON instead of formatted text
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show portfolio content, served from cache when fresh
    Show {
        /// Resource to show (skills, projects, services, contact, cv, about); all when omitted
        resource: Option<ResourceKey>,
    },

    /// Fetch content from the backend, bypassing the cache
    Refresh {
        /// Resource to refresh; all when omitted
        resource: Option<ResourceKey>,
    },

    /// Show cache ages and session state
    Status,

    /// Cache maintenance
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Sign in as the site owner
    Login {
        /// Owner email (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,

        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },

    /// Sign out and forget the session
    Logout {
        /// Also remove the stored password
        #[arg(long)]
        forget: bool,
    },

    /// Send a message through the public contact form
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        message: String,
    },

    /// Edit content (requires login)
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove cached content
    Clear {
        /// Resource to clear; all when omitted
        resource: Option<ResourceKey>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Add a row to a list resource (skills, projects, services)
    Create {
        resource: ResourceKey,

        #[command(flatten)]
        input: RowInput,
    },

    /// Replace a row of a list resource
    Update {
        resource: ResourceKey,

        /// Row id
        id: String,

        #[command(flatten)]
        input: RowInput,
    },

    /// Delete a row of a list resource
    Delete {
        resource: ResourceKey,

        /// Row id
        id: String,
    },

    /// Save a single-row resource (contact, cv, about)
    Save {
        resource: ResourceKey,

        #[command(flatten)]
        input: RowInput,
    },

    /// Upload an image and print its public URL
    UploadImage {
        /// Image file to upload
        file: PathBuf,

        /// Storage folder
        #[arg(long, default_value = "projects")]
        folder: String,
    },

    /// Upload the CV PDF and point the CV section at it
    UploadCv {
        /// PDF file to upload
        file: PathBuf,
    },
}

/// Row content, given inline or read from a file.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct RowInput {
    /// Row as a JSON object
    #[arg(long)]
    pub data: Option<String>,

    /// Path to a JSON file holding the row
    #[arg(long)]
    pub file: Option<PathBuf>,
}
