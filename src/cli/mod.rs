//! CLI module - Command-line interface for `ClinicDesk`
//!
//! Operator tasks that don't need the web UI: first-run setup, account
//! maintenance, and the TV panel token.

mod commands;

use clap::{Parser, Subcommand};

/// `ClinicDesk` - clinic front-desk server
/// Staff sign-in, role-based page access, and the waiting-room TV panel
#[derive(Parser)]
#[command(name = "clinicdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Write a default config file, migrate the database, and seed accounts
    #[command(alias = "--init")]
    Init,

    /// Manage user accounts
    #[command(alias = "u")]
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show or rotate the TV panel access token
    TvToken {
        #[command(subcommand)]
        command: TvTokenCommands,
    },

    /// Session housekeeping
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all accounts
    #[command(alias = "ls")]
    List,

    /// Create an account
    Create {
        /// Display name
        name: String,

        /// Login email
        email: String,

        /// Role code: admin, physician, front_desk, tv
        #[arg(long, default_value = "front_desk")]
        role: String,

        /// Password; a random one is generated and printed when omitted
        #[arg(long)]
        password: Option<String>,

        /// Linked physician profile id
        #[arg(long)]
        staff_profile_id: Option<i32>,
    },

    /// Set a new password for an account
    ResetPassword {
        /// Login email
        email: String,

        /// New password
        password: String,
    },

    /// Deactivate an account
    #[command(alias = "rm")]
    Deactivate {
        /// User ID
        id: i32,
    },
}

#[derive(Subcommand)]
pub enum TvTokenCommands {
    /// Print the current token and panel URL
    Show,

    /// Replace the token; the old link stops working
    Regenerate,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Delete expired sessions
    Sweep,
}

pub use commands::*;
