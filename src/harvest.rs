//! Submission harvesting: list, fetch, persist and reshape
//!
//! One run lists every submission in the date range, then fetches each one
//! in turn, writes the raw record, and writes the reshaped document when the
//! submission's form can be resolved. A failure on one submission is
//! counted and logged; only a failure of the listing itself aborts the run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{CanvasApi, FormLookup, PageWalker, SubmissionFilter, SubmissionPages};
use crate::model::{scalar::value_as_id, scalar_to_string, FormDefinition, Submission};
use crate::output;
use crate::transform::{self, SchemaIndex};

/// `YYYY-MM-DD` bounds covering the last `days` days up to `today`
pub fn date_range(days: i64, today: NaiveDate) -> Result<(String, String)> {
    if days < 0 {
        bail!("days must not be negative, got {days}");
    }
    let start = Duration::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| anyhow!("{days} days before {today} is out of range"))?;
    Ok((
        start.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    ))
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub retrieved: usize,
    pub retrieval_failed: usize,
    pub transformed: usize,
    pub transform_failed: usize,
}

/// Settings for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub filter: SubmissionFilter,
    /// Form used when a submission does not name its own
    pub default_form_id: Option<u64>,
    pub output_dir: PathBuf,
    pub per_page: u32,
}

/// Forms fetched during a run, keyed by form id.
///
/// Failed lookups are remembered too, so every id is requested at most once.
#[derive(Debug, Default)]
pub struct FormCache {
    entries: HashMap<u64, Option<SchemaIndex>>,
}

impl FormCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return the indexed form, fetching and saving it on first use
    pub async fn get_or_fetch<A: CanvasApi>(
        &mut self,
        api: &A,
        form_id: u64,
        output_dir: &Path,
    ) -> Option<&SchemaIndex> {
        match self.entries.entry(form_id) {
            Entry::Occupied(slot) => slot.into_mut().as_ref(),
            Entry::Vacant(slot) => slot
                .insert(fetch_form(api, form_id, output_dir).await)
                .as_ref(),
        }
    }
}

async fn fetch_form<A: CanvasApi>(api: &A, form_id: u64, output_dir: &Path) -> Option<SchemaIndex> {
    info!("Retrieving form ID {form_id}...");
    let raw = match api.get_form(form_id, &FormLookup::published()).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Error retrieving form {form_id}: {e}");
            return None;
        }
    };

    let form: FormDefinition = match serde_json::from_value(raw.clone()) {
        Ok(form) => form,
        Err(e) => {
            error!("Form {form_id} could not be read: {e}");
            return None;
        }
    };

    let path = output_dir.join(output::form_file_name(form_id, &form.name));
    match output::write_json(&path, &raw) {
        Ok(()) => info!("Saved form {form_id} ({}) to {}", form.name, path.display()),
        Err(e) => warn!("Could not save form {form_id}: {e:#}"),
    }

    let index = SchemaIndex::build(&form);
    if index.is_empty() {
        warn!("Form {form_id} defines no entries; its submissions will have empty sections");
    }
    Some(index)
}

/// Result of processing one listed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    RetrievalFailed,
    Retrieved { transformed: bool },
}

/// Drives one harvest run against a forms service
pub struct Harvester<'a, A: CanvasApi> {
    api: &'a A,
    options: HarvestOptions,
    forms: FormCache,
}

impl<'a, A: CanvasApi> Harvester<'a, A> {
    pub fn new(api: &'a A, options: HarvestOptions) -> Self {
        Self {
            api,
            options,
            forms: FormCache::default(),
        }
    }

    /// List and process every submission. Fails only if the listing fails.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let filter = &self.options.filter;
        info!(
            "Retrieving submissions from {} to {}",
            filter.start_date.as_deref().unwrap_or("beginning"),
            filter.end_date.as_deref().unwrap_or("now")
        );
        if let Some(form_id) = filter.form_id {
            info!("Filtering by form_id: {form_id}");
        }

        let pages = SubmissionPages {
            api: self.api,
            filter,
        };
        let listing = PageWalker::new(self.options.per_page)
            .fetch_all(&pages)
            .await
            .context("Error retrieving submissions")?;

        let mut summary = RunSummary {
            found: listing.len(),
            ..Default::default()
        };
        if listing.is_empty() {
            warn!("No submissions found for the specified date range");
            return Ok(summary);
        }
        if self.options.default_form_id.is_none() {
            warn!("No form_id configured; submissions that do not name their form will not be transformed");
        }

        info!(
            "Found {} submissions. Retrieving full details for each...",
            listing.len()
        );
        for (n, record) in listing.iter().enumerate() {
            info!(
                "Processing submission {}/{}: ID {}",
                n + 1,
                listing.len(),
                scalar_to_string(&record["id"])
            );
            match self.process(record).await {
                Outcome::RetrievalFailed => summary.retrieval_failed += 1,
                Outcome::Retrieved { transformed } => {
                    summary.retrieved += 1;
                    if transformed {
                        summary.transformed += 1;
                    } else {
                        summary.transform_failed += 1;
                    }
                }
            }
        }

        debug!("{} distinct forms requested", self.forms.len());
        Ok(summary)
    }

    async fn process(&mut self, listed: &Value) -> Outcome {
        let id = scalar_to_string(&listed["id"]);
        if id.is_empty() {
            warn!("Submission has no ID, skipping");
            return Outcome::RetrievalFailed;
        }

        let raw = match self.api.get_submission(&id).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error processing submission {id}: {e}");
                return Outcome::RetrievalFailed;
            }
        };

        let stem = output::submission_stem(&id, &scalar_to_string(&listed["submission_number"]));
        let raw_path = self.options.output_dir.join(format!("{stem}.json"));
        if let Err(e) = output::write_json(&raw_path, &raw) {
            error!("Error processing submission {id}: {e:#}");
            return Outcome::RetrievalFailed;
        }
        debug!("Saved submission {id} to {}", raw_path.display());

        let transformed = match self.reshape(listed, raw, &stem).await {
            Ok(path) => {
                info!("Saved transformed submission {id} to {}", path.display());
                true
            }
            Err(e) => {
                error!("Error transforming submission {id}: {e:#}");
                false
            }
        };
        Outcome::Retrieved { transformed }
    }

    async fn reshape(&mut self, listed: &Value, raw: Value, stem: &str) -> Result<PathBuf> {
        let submission: Submission =
            serde_json::from_value(raw).context("submission could not be read")?;

        let form_id = submission
            .source_form_id()
            .or_else(|| listed.get("form_id").and_then(value_as_id))
            .or(self.options.default_form_id)
            .filter(|id| *id != 0)
            .ok_or_else(|| anyhow!("no form id available"))?;

        let index = self
            .forms
            .get_or_fetch(self.api, form_id, &self.options.output_dir)
            .await
            .ok_or_else(|| anyhow!("form {form_id} is unavailable"))?;

        info!("Transforming submission {} to v2 format...", submission.id);
        let outcome = transform::transform(&submission, index);

        let path = self.options.output_dir.join(format!("{stem}_v2.json"));
        output::write_json(&path, &outcome.document)?;
        Ok(path)
    }
}

/// Log the end-of-run report
pub fn report(summary: &RunSummary, options: &HarvestOptions) {
    info!("Retrieval complete!");
    info!("Output directory: {}", options.output_dir.display());
    info!("Summary:");
    info!("  Total submissions found: {}", summary.found);
    info!("  Submissions successfully retrieved: {}", summary.retrieved);
    info!("  Submissions failed: {}", summary.retrieval_failed);
    info!("  Submissions transformed to v2: {}", summary.transformed);
    if summary.transform_failed > 0 {
        info!("  Transformations failed: {}", summary.transform_failed);
    }
    if let (Some(start), Some(end)) = (&options.filter.start_date, &options.filter.end_date) {
        info!("  Date range: {start} to {end}");
    }
    if let Some(form_id) = options.filter.form_id {
        info!("  Form ID filter: {form_id}");
    }
}
