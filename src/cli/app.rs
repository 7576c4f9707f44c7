//! CLI module for the servicelog application
//!
//! This module maps parsed commands onto [`ServiceBook`] operations and
//! renders the results.
use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use chrono::NaiveDate;
use log::info;

use crate::{
    days_left, helper, local_today, Category, Commands, Config, ContactCommand, ContactDraft,
    ContactFilter, ContactGroup, ContactPatch, ExpenseReport, Result, ServiceBook,
    ServiceCommand, ServiceDate, ServiceDraft, ServiceFilter, ServiceLogError, ServicePatch,
    ServiceRecord,
};

/// CLI Application handler - processes CLI commands against the service book
pub struct App {
    book: ServiceBook,

    /// Application configuration
    config: Config,

    /// Where `config` was loaded from
    config_path: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

fn separator() -> String {
    let term_width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);
    "-".repeat(term_width.min(50))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    stdout().flush().map_err(ServiceLogError::Io)?;

    let mut input = String::new();
    stdin().read_line(&mut input).map_err(ServiceLogError::Io)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

impl App {
    pub fn new(book: ServiceBook, config: Config, config_path: PathBuf, verbose: bool) -> Self {
        Self {
            book,
            config,
            config_path,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        let today = local_today();

        match command {
            Commands::Service(command) => self.handle_service(command, today).await?,

            Commands::Upcoming { json } => self.show_upcoming(json, today).await?,

            Commands::History {
                search,
                category,
                range,
                json,
            } => {
                let filter = ServiceFilter {
                    search,
                    categories: helper::parse_categories(category)?,
                    range: range.map(|r| r.parse()).transpose()?,
                };
                self.show_history(filter, json, today).await?
            }

            Commands::Report { json } => {
                let report = self.book.report(today).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    self.display_report(&report);
                }
            }

            Commands::Contact(command) => self.handle_contact(command).await?,

            Commands::Reset { force } => {
                if force || confirm("Delete ALL service records and contacts?")? {
                    self.book.reset_all().await?;
                    println!("All data has been reset.");
                } else {
                    println!("Reset cancelled.");
                }
            }

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset)?,
        }

        Ok(())
    }

    async fn handle_service(&self, command: ServiceCommand, today: NaiveDate) -> Result<()> {
        match command {
            ServiceCommand::Add {
                category,
                item,
                repair_type,
                date,
                cost,
                note,
                image,
                no_reminder,
            } => {
                let draft = ServiceDraft {
                    category: category.parse()?,
                    item_name: item.trim().to_string(),
                    repair_type: repair_type.trim().to_string(),
                    date: ServiceDate::parse(date.trim())?,
                    cost: cost.trim().to_string(),
                    note: helper::non_empty(note),
                    image: helper::non_empty(image),
                };
                let remind = self.config.reminders_enabled && !no_reminder;
                let record = self.book.add_service(draft, remind, today).await?;

                println!("Service created with ID: {}", record.id);
                if record.reminder_id.is_some() {
                    println!("Reminder set for {}", record.date);
                }
            }

            ServiceCommand::Edit {
                id,
                category,
                item,
                repair_type,
                date,
                cost,
                note,
                image,
            } => {
                let patch = ServicePatch {
                    category: category.map(|c| c.parse::<Category>()).transpose()?,
                    item_name: item.map(|s| s.trim().to_string()),
                    repair_type: repair_type.map(|s| s.trim().to_string()),
                    date: date.map(|d| ServiceDate::parse(d.trim())).transpose()?,
                    cost: cost.map(|s| s.trim().to_string()),
                    note: helper::optional_field(note),
                    image: helper::optional_field(image),
                    reminder_id: None,
                };
                if patch.is_empty() {
                    return Err(ServiceLogError::InvalidInput {
                        message: "nothing to change".to_string(),
                    });
                }
                let record = self.book.edit_service(&id, patch, today).await?;
                println!("Service {} updated.", record.id);
                if self.verbose {
                    self.display_services_text(&[record], today);
                }
            }

            ServiceCommand::Show { id, json } => {
                let record = self.book.service(&id).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                } else {
                    self.display_services_text(&[record], today);
                }
            }

            ServiceCommand::Complete { id } => {
                let record = self.book.mark_complete(&id, today).await?;
                println!(
                    "'{}' marked as completed on {}.",
                    record.item_name, record.date
                );
            }

            ServiceCommand::Delete { id, force } => {
                let record = self.book.service(&id).await?;

                if !force {
                    println!("You are about to delete the following service:");
                    self.display_services_text(std::slice::from_ref(&record), today);
                    println!("\nThis action cannot be undone!");
                    if !confirm("Are you sure you want to delete this service?")? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                self.book.delete_service(&id).await?;
                println!(
                    "Service '{}' ({}) has been permanently deleted.",
                    record.item_name, record.id
                );
            }
        }

        Ok(())
    }

    async fn show_upcoming(&self, json: bool, today: NaiveDate) -> Result<()> {
        let dashboard = self.book.dashboard(today).await?;
        if let Some(corruption) = &dashboard.corruption {
            eprintln!(
                "{} stored services could not be read: {}",
                console::style("warning:").yellow().bold(),
                corruption
            );
        }

        let upcoming = &dashboard.partition.upcoming;
        if json {
            println!("{}", serde_json::to_string_pretty(upcoming)?);
            return Ok(());
        }

        if upcoming.is_empty() {
            println!("No upcoming services.");
        } else {
            self.display_services_text(upcoming, today);
        }
        println!(
            "\nSpent this month: {}",
            console::style(format!("{:.2}", dashboard.monthly_total)).bold()
        );
        self.report_invalid(&dashboard.partition.invalid);
        Ok(())
    }

    async fn show_history(&self, filter: ServiceFilter, json: bool, today: NaiveDate) -> Result<()> {
        let filtered = self.book.services(&filter, today).await?;
        let view = crate::partition(&filtered, today);

        if json {
            println!("{}", serde_json::to_string_pretty(&view.history)?);
            return Ok(());
        }

        if view.history.is_empty() {
            println!("No completed services found matching the criteria.");
        } else {
            self.display_services_text(&view.history, today);
            println!(
                "\nFound {} service{}",
                view.history.len(),
                if view.history.len() == 1 { "" } else { "s" }
            );
        }
        self.report_invalid(&view.invalid);
        Ok(())
    }

    fn report_invalid(&self, invalid: &[crate::InvalidRecord]) {
        if invalid.is_empty() {
            return;
        }
        eprintln!(
            "{} {} record{} skipped because of an unreadable date",
            console::style("warning:").yellow().bold(),
            invalid.len(),
            if invalid.len() == 1 { "" } else { "s" }
        );
        if self.verbose {
            for record in invalid {
                eprintln!("  {}: {}", record.id, record.reason);
            }
        }
    }

    fn display_services_text(&self, records: &[ServiceRecord], today: NaiveDate) {
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                println!("{}", separator());
            }

            println!("ID: {} | {}", record.id, record.category.label());
            println!(
                "{} - {}",
                console::style(&record.item_name).bold(),
                record.repair_type
            );

            let when = match record.service_date() {
                Ok(date) => match days_left(date, today) {
                    d if d > 1 => format!("{} (in {} days)", record.date, d),
                    1 => format!("{} (tomorrow)", record.date),
                    0 => format!("{} (today)", record.date),
                    d => format!("{} ({} days ago)", record.date, -d),
                },
                Err(_) => format!("{} (unreadable date)", record.date),
            };
            println!("Date: {}", console::style(when).cyan());

            if !record.cost.trim().is_empty() {
                println!("Cost: {:.2}", record.cost_value());
            }
            if let Some(note) = &record.note {
                println!("Note: {}", note);
            }
            if self.verbose {
                if let Some(image) = &record.image {
                    println!("Image: {}", image);
                }
                if let Some(reminder) = &record.reminder_id {
                    println!("Reminder: {}", reminder);
                }
                println!("Created: {}", record.created_at.format("%Y-%m-%d %H:%M"));
            }
        }
    }

    fn display_report(&self, report: &ExpenseReport) {
        println!("{}", console::style(format!("Expenses {}", report.year)).bold());
        println!("This month: {:.2}", report.month_total);
        println!("This year:  {:.2}", report.year_total);

        if !report.by_category.is_empty() {
            println!("\nBy category:");
            for (category, total) in &report.by_category {
                println!("  {:<16} {:>10.2}", category.label(), total);
            }
        }

        println!("\nBy month:");
        for (month0, total) in report.by_month.iter().enumerate() {
            if *total > 0.0 {
                let name = NaiveDate::from_ymd_opt(report.year, month0 as u32 + 1, 1)
                    .map(|d| d.format("%B").to_string())
                    .unwrap_or_default();
                println!("  {:<16} {:>10.2}", name, total);
            }
        }
    }

    async fn handle_contact(&self, command: ContactCommand) -> Result<()> {
        match command {
            ContactCommand::Add {
                name,
                phone,
                specialty,
                email,
                address,
            } => {
                let contact = self
                    .book
                    .add_contact(ContactDraft {
                        name: name.trim().to_string(),
                        phone: phone.trim().to_string(),
                        specialty: helper::non_empty(specialty),
                        email: helper::non_empty(email),
                        address: helper::non_empty(address),
                    })
                    .await?;
                println!("Contact created with ID: {}", contact.id);
            }

            ContactCommand::Edit {
                id,
                name,
                phone,
                specialty,
                email,
                address,
            } => {
                let contact = self
                    .book
                    .edit_contact(
                        &id,
                        ContactPatch {
                            name: name.map(|s| s.trim().to_string()),
                            phone: phone.map(|s| s.trim().to_string()),
                            specialty: helper::optional_field(specialty),
                            email: helper::optional_field(email),
                            address: helper::optional_field(address),
                        },
                    )
                    .await?;
                println!("Contact '{}' updated.", contact.name);
            }

            ContactCommand::List {
                search,
                specialty,
                json,
            } => {
                let groups = self
                    .book
                    .contacts(&ContactFilter { search, specialty })
                    .await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&groups)?);
                } else {
                    self.display_contacts(&groups);
                }
            }

            ContactCommand::Delete { id } => {
                self.book.delete_contact(&id).await?;
                println!("Contact {} deleted.", id);
            }
        }

        Ok(())
    }

    fn display_contacts(&self, groups: &[ContactGroup]) {
        if groups.is_empty() {
            println!("No contacts found.");
            return;
        }

        for group in groups {
            println!("{}", console::style(&group.key).bold().underlined());
            for contact in &group.contacts {
                let specialty = contact
                    .specialty
                    .as_deref()
                    .map(|s| format!(" [{}]", s))
                    .unwrap_or_default();
                println!("  {}{}  {}", contact.name, specialty, contact.phone);
                if self.verbose {
                    println!("    id: {}", contact.id);
                    if let Some(email) = &contact.email {
                        println!("    email: {}", email);
                    }
                    if let Some(address) = &contact.address {
                        println!("    address: {}", address);
                    }
                }
            }
        }
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        let nothing_requested = !show && !reset && set.is_none();

        if reset {
            self.config = Config::default();
            self.config.save(&self.config_path)?;
            info!("Configuration reset to defaults");
            println!("Configuration reset to defaults.");
        }

        if let Some(assignment) = set {
            self.config.set(&assignment)?;
            self.config.save(&self.config_path)?;
            println!("Configuration updated.");
        }

        if show || nothing_requested {
            println!("Configuration file: {}", self.config_path.display());
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }

        Ok(())
    }
}
