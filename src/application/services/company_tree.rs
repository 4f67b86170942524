//! Company tree service
//!
//! Loads travel and company records, builds the forest with aggregated costs,
//! and renders or writes the result.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::application::ingest::{parse_companies, parse_travels};
use crate::application::{ApplicationError, ApplicationResult, FileOp, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    group_by_company_id, CompanyRecord, CompanyView, Forest, ForestBuilder, TravelRecord,
};
use crate::infrastructure::traits::FileSystem;

/// Knobs of the pipeline, usually taken from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Reject travels of companies missing from the company list
    pub strict_expenses: bool,
    /// `parentId` values that mean "no parent"
    pub root_markers: Vec<String>,
    /// Pretty-print the JSON document
    pub pretty: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for TreeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            strict_expenses: settings.strict_expenses,
            root_markers: settings.root_markers.clone(),
            pretty: settings.pretty,
        }
    }
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct CompanyTreeOutput {
    /// Forest with every cost computed
    pub forest: Forest,
    /// Root companies with nested children, in input order
    pub views: Vec<CompanyView>,
    /// Sum of all root costs
    pub total_cost: Decimal,
}

/// Service turning flat travel and company records into a cost forest.
pub struct CompanyTreeService {
    fs: Arc<dyn FileSystem>,
    options: TreeOptions,
}

impl CompanyTreeService {
    /// Create a new company tree service.
    pub fn new(fs: Arc<dyn FileSystem>, options: TreeOptions) -> Self {
        Self { fs, options }
    }

    /// Read and parse a travels document.
    pub fn load_travels(&self, path: &Path) -> ApplicationResult<Vec<TravelRecord>> {
        let content = self
            .fs
            .read_to_string(path)
            .during(FileOp::ReadTravels, path)?;
        parse_travels(&content)
    }

    /// Read and parse a companies document.
    pub fn load_companies(&self, path: &Path) -> ApplicationResult<Vec<CompanyRecord>> {
        let content = self
            .fs
            .read_to_string(path)
            .during(FileOp::ReadCompanies, path)?;
        parse_companies(&content, &self.options.root_markers)
    }

    /// Aggregate expenses, link companies, and compute every cost.
    #[instrument(level = "debug", skip_all, fields(travels = travels.len(), companies = companies.len()))]
    pub fn build_forest(
        &self,
        travels: &[TravelRecord],
        companies: &[CompanyRecord],
    ) -> ApplicationResult<CompanyTreeOutput> {
        let expenses = group_by_company_id(travels)?;
        debug!(
            "direct expenses: {} companies, {} total",
            expenses.len(),
            expenses.grand_total()
        );

        let mut forest = ForestBuilder::new(expenses)
            .strict_expenses(self.options.strict_expenses)
            .build(companies)?;
        let total_cost = forest.compute_all()?;
        let views = forest.to_views()?;

        Ok(CompanyTreeOutput {
            forest,
            views,
            total_cost,
        })
    }

    /// Run the whole pipeline from two input files.
    #[instrument(level = "debug", skip(self))]
    pub fn build(
        &self,
        travels_path: &Path,
        companies_path: &Path,
    ) -> ApplicationResult<CompanyTreeOutput> {
        let start = Instant::now();

        let travels = self.load_travels(travels_path)?;
        let companies = self.load_companies(companies_path)?;
        let output = self.build_forest(&travels, &companies)?;

        info!(
            "built {} root companies from {} companies in {:?}",
            output.views.len(),
            companies.len(),
            start.elapsed()
        );
        Ok(output)
    }

    /// Serialize root views as a JSON document.
    pub fn render(&self, views: &[CompanyView]) -> ApplicationResult<String> {
        let rendered = if self.options.pretty {
            serde_json::to_string_pretty(views)
        } else {
            serde_json::to_string(views)
        };
        rendered.map_err(|source| ApplicationError::Json {
            context: "company tree output".to_string(),
            source,
        })
    }

    /// Render and write the document to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, views))]
    pub fn write_output(&self, views: &[CompanyView], path: &Path) -> ApplicationResult<()> {
        let document = self.render(views)?;
        self.fs
            .ensure_parent(path)
            .during(FileOp::CreateOutputDir, path)?;
        self.fs
            .write(path, &document)
            .during(FileOp::WriteCompanyTree, path)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}
