//! Shared types for the servicelog application.
//!
//! This module contains the crate-wide `Result` alias and the command-line
//! command definitions.
use clap::Subcommand;

use crate::ServiceLogError;

/// A specialized Result type for servicelog operations.
pub type Result<T> = std::result::Result<T, ServiceLogError>;

/// Available subcommands for the servicelog application
#[derive(Subcommand)]
pub enum Commands {
    /// Add, edit, complete or delete service records
    #[clap(subcommand)]
    Service(ServiceCommand),

    /// Show services that are still due, soonest first
    Upcoming {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show completed services, most recent first
    History {
        /// Case-insensitive text to look for in the item name
        #[clap(short, long)]
        search: Option<String>,

        /// Categories to include (comma-separated)
        #[clap(short, long)]
        category: Option<String>,

        /// Date window: last30, last90, thisMonth, lastMonth, last6Months, thisYear
        #[clap(short, long)]
        range: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Expense report for the current year
    Report {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Manage service provider contacts
    #[clap(subcommand)]
    Contact(ContactCommand),

    /// Delete all service records and contacts
    Reset {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// Record a new service
    Add {
        /// home_appliances, vehicles, entertainment, computing, security or other
        #[clap(short = 'C', long)]
        category: String,

        /// Item that was (or will be) serviced
        #[clap(short, long)]
        item: String,

        /// Work performed or needed
        #[clap(short = 't', long = "type")]
        repair_type: String,

        /// Service date as "MM - DD - YYYY"
        #[clap(short, long)]
        date: String,

        /// Cost of the service
        #[clap(short, long, default_value = "")]
        cost: String,

        /// Free-form note
        #[clap(short, long)]
        note: Option<String>,

        /// Path or URI of a photo
        #[clap(long)]
        image: Option<String>,

        /// Do not schedule a reminder for an upcoming service
        #[clap(long)]
        no_reminder: bool,
    },

    /// Edit fields of a service; pass an empty value to clear optional fields
    Edit {
        /// ID of the service to edit
        id: String,

        #[clap(short = 'C', long)]
        category: Option<String>,

        #[clap(short, long)]
        item: Option<String>,

        #[clap(short = 't', long = "type")]
        repair_type: Option<String>,

        /// New date as "MM - DD - YYYY"
        #[clap(short, long)]
        date: Option<String>,

        #[clap(short, long)]
        cost: Option<String>,

        #[clap(short, long)]
        note: Option<String>,

        #[clap(long)]
        image: Option<String>,
    },

    /// Show a single service
    Show {
        /// ID of the service
        id: String,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Mark an upcoming service as done today
    Complete {
        /// ID of the service
        id: String,
    },

    /// Delete a service by ID
    Delete {
        /// ID of the service to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ContactCommand {
    /// Add a contact
    Add {
        #[clap(short, long)]
        name: String,

        #[clap(short, long)]
        phone: String,

        /// What the provider does (plumber, mechanic, ...)
        #[clap(short, long)]
        specialty: Option<String>,

        #[clap(short, long)]
        email: Option<String>,

        #[clap(short, long)]
        address: Option<String>,
    },

    /// Edit a contact; pass an empty value to clear optional fields
    Edit {
        /// ID of the contact to edit
        id: String,

        #[clap(short, long)]
        name: Option<String>,

        #[clap(short, long)]
        phone: Option<String>,

        #[clap(short, long)]
        specialty: Option<String>,

        #[clap(short, long)]
        email: Option<String>,

        #[clap(short, long)]
        address: Option<String>,
    },

    /// List contacts grouped by initial
    List {
        /// Text to look for in name or phone
        #[clap(short, long)]
        search: Option<String>,

        /// Only contacts with this specialty
        #[clap(long)]
        specialty: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Delete a contact by ID
    Delete {
        /// ID of the contact to delete
        id: String,
    },
}
