//! Command handlers behind the CLI subcommands

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{
    CanvasApi, FormLookup, FormPages, FormQuery, PageWalker, SubmissionFilter, SubmissionPages,
};
use crate::config::ApiConfig;
use crate::harvest::{self, HarvestOptions, Harvester};
use crate::model::{FormDefinition, Submission};
use crate::output;
use crate::transform::{self, SchemaIndex};

/// Where listing output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Screen,
    /// A file; `None` picks the command's default name
    File(Option<PathBuf>),
}

/// Which pages of a listing to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Single(u32),
}

fn emit<T: serde::Serialize + ?Sized>(
    value: &T,
    destination: Destination,
    default_name: impl FnOnce() -> String,
) -> Result<()> {
    match destination {
        Destination::Screen => println!("{}", output::to_json_string(value)?),
        Destination::File(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(default_name()));
            output::write_json(&path, value)?;
            info!("Output saved to: {}", path.display());
        }
    }
    Ok(())
}

/// Build the listing filter. Explicit dates win over `days`.
pub fn submission_filter(
    days: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    form_id: Option<u64>,
    today: NaiveDate,
) -> Result<SubmissionFilter> {
    let (start_date, end_date) = match (start_date, days) {
        (Some(start), _) => (Some(start), end_date),
        (None, Some(days)) => {
            let (start, end) = harvest::date_range(days, today)?;
            (Some(start), end_date.or(Some(end)))
        }
        (None, None) => (None, end_date),
    };
    Ok(SubmissionFilter {
        start_date,
        end_date,
        form_id,
    })
}

pub async fn harvest<A: CanvasApi>(
    api: &A,
    config: &ApiConfig,
    days: i64,
    output_dir: Option<&str>,
    per_page: u32,
) -> Result<()> {
    let now = Local::now();
    let (start, end) = harvest::date_range(days, now.date_naive())?;
    let output_dir = output::output_dir(output_dir, now);
    if output::ensure_dir(&output_dir)? {
        info!("Created output directory: {}", output_dir.display());
    }

    let options = HarvestOptions {
        filter: SubmissionFilter {
            start_date: Some(start),
            end_date: Some(end),
            form_id: config.form_id,
        },
        default_form_id: config.form_id,
        output_dir,
        per_page,
    };

    let summary = Harvester::new(api, options.clone()).run().await?;
    harvest::report(&summary, &options);
    Ok(())
}

pub async fn list_forms<A: CanvasApi>(
    api: &A,
    status: Option<String>,
    per_page: u32,
    destination: Destination,
) -> Result<()> {
    let query = FormQuery { status };
    let pages = FormPages { api, query: &query };
    let forms = PageWalker::new(per_page)
        .fetch_all(&pages)
        .await
        .context("Error listing forms")?;

    info!("Found {} forms", forms.len());
    emit(&forms, destination, || {
        output::forms_list_file_name(Local::now())
    })
}

pub async fn get_form<A: CanvasApi>(
    api: &A,
    form_id: u64,
    lookup: &FormLookup,
    destination: Destination,
) -> Result<()> {
    let raw = api
        .get_form(form_id, lookup)
        .await
        .with_context(|| format!("Error retrieving form {form_id}"))?;

    let name = raw
        .get("name")
        .map(crate::model::scalar_to_string)
        .unwrap_or_default();
    info!("Retrieved form {form_id}: {name}");
    emit(&raw, destination, || output::form_file_name(form_id, &name))
}

/// Fetch the listing and return the records
pub async fn fetch_submission_list<A: CanvasApi>(
    api: &A,
    filter: &SubmissionFilter,
    pages: PageSelection,
    per_page: u32,
) -> Result<Vec<Value>> {
    let walker = PageWalker::new(per_page);
    let source = SubmissionPages { api, filter };
    let records = match pages {
        PageSelection::All => walker.fetch_all(&source).await,
        PageSelection::Single(page) => walker
            .fetch_page(&source, page)
            .await
            .map(|envelope| envelope.into_records()),
    };
    records.context("Error listing submissions")
}

pub async fn list_submissions<A: CanvasApi>(
    api: &A,
    filter: &SubmissionFilter,
    pages: PageSelection,
    per_page: u32,
    destination: Destination,
) -> Result<()> {
    let records = fetch_submission_list(api, filter, pages, per_page).await?;
    if records.is_empty() {
        warn!("No submissions found");
    } else {
        info!("Found {} submissions", records.len());
    }
    emit(&records, destination, || {
        output::submission_list_file_name(
            filter.start_date.as_deref(),
            filter.end_date.as_deref(),
            filter.form_id,
            Local::now(),
        )
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Transform a saved submission with a saved form, without contacting the service
pub fn transform_files(form: &Path, submission: &Path, output: Option<&Path>) -> Result<()> {
    let form: FormDefinition = read_json(form)?;
    let submission: Submission = read_json(submission)?;

    let index = SchemaIndex::build(&form);
    let outcome = transform::transform(&submission, &index);
    info!(
        "Mapped {}/{} responses",
        outcome.diagnostics.mapped, outcome.diagnostics.total
    );

    match output {
        Some(path) => {
            output::write_json(path, &outcome.document)?;
            info!("Output saved to: {}", path.display());
        }
        None => println!("{}", output::to_json_string(&outcome.document)?),
    }
    Ok(())
}
