// crates/fcs-runner/src/journey.rs
// ============================================================================
// Module: Conformance Journey
// Description: Turns a discovery document into a compiled, token-planned test plan.
// Purpose: Own the per-journey state the pipeline stages share.
// Dependencies: fcs-core, fcs-report
// ============================================================================

//! ## Overview
//! A [`Journey`] owns everything that lives for one conformance run: the
//! event sink, the macro clock, the token-name counter and the manifest
//! source. [`Journey::plan`] walks the discovery items in order and, for each
//! one, resolves the specification family, loads its manifest, filters the
//! scripts to the implemented endpoints and the specification version,
//! compiles them, injects conditional properties and packs the resulting test
//! cases into access-token groups.
//!
//! Token names are numbered across the whole journey, so two journeys never
//! share a counter and one journey never reuses a name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use fcs_core::ApiSpecification;
use fcs_core::CompileError;
use fcs_core::CompileRequest;
use fcs_core::Compiler;
use fcs_core::Context;
use fcs_core::DEFAULT_ASSERTIONS_URI;
use fcs_core::DEFAULT_DATA_URI;
use fcs_core::DiscoveryItem;
use fcs_core::DiscoveryModel;
use fcs_core::EndpointFilter;
use fcs_core::EventSink;
use fcs_core::MacroTable;
use fcs_core::ManifestSource;
use fcs_core::PipelineEvent;
use fcs_core::References;
use fcs_core::SpecType;
use fcs_core::TestCase;
use fcs_core::TestResult;
use fcs_core::TokenGroup;
use fcs_core::TokenNamer;
use fcs_core::Validator;
use fcs_core::filter_by_version;
use fcs_core::group_permissions;
use fcs_core::inject_conditional_properties;
use fcs_core::inject_tokens;
use fcs_core::load_manifest_bytes;
use fcs_core::load_references;
use fcs_core::manifest::API_VERSIONS_KEY;
use fcs_core::permission_sets;
use fcs_report::SpecificationResults;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Event emitted once per planned specification.
pub const TEST_PLAN_COMPILED_EVENT: &str = "test_plan_compiled";

/// Response validators keyed by the schema URL of their specification.
pub type ValidatorMap = BTreeMap<String, Arc<dyn Validator>>;

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Compiled test cases and token groups for one discovery item.
#[derive(Debug, Clone)]
pub struct SpecificationPlan {
    /// Specification metadata copied from discovery.
    pub specification: ApiSpecification,
    /// Specification family.
    pub spec_type: SpecType,
    /// Manifest the scripts were loaded from.
    pub manifest_uri: String,
    /// Compiled test cases in script ID order.
    pub test_cases: Vec<TestCase>,
    /// Access-token groups covering the non client-credentials test cases.
    pub token_groups: Vec<TokenGroup>,
    /// Parent context seeded for this specification.
    pub context: Context,
}

impl SpecificationPlan {
    /// Collects the results belonging to this specification, in result order.
    #[must_use]
    pub fn results(&self, results: &[TestResult]) -> SpecificationResults {
        let results = results
            .iter()
            .filter(|result| self.test_cases.iter().any(|test_case| test_case.id == result.id))
            .cloned()
            .collect();
        SpecificationResults {
            name: self.specification.name.clone(),
            version: self.specification.version.clone(),
            schema_url: self.specification.schema_url().to_string(),
            results,
        }
    }
}

/// Test plan for a whole journey.
#[derive(Debug, Clone, Default)]
pub struct TestPlan {
    /// Per-specification plans in discovery order.
    pub specifications: Vec<SpecificationPlan>,
    /// Raw manifest bytes in load order, for the manifest digest.
    manifest_bytes: Vec<u8>,
}

impl TestPlan {
    /// Returns the total number of compiled test cases.
    #[must_use]
    pub fn test_case_count(&self) -> usize {
        self.specifications.iter().map(|plan| plan.test_cases.len()).sum()
    }

    /// Returns the concatenated manifest bytes.
    #[must_use]
    pub fn manifest_bytes(&self) -> &[u8] {
        &self.manifest_bytes
    }

    /// Splits run results by specification.
    #[must_use]
    pub fn specification_results(&self, results: &[TestResult]) -> Vec<SpecificationResults> {
        self.specifications.iter().map(|plan| plan.results(results)).collect()
    }

    /// Finds a compiled test case by identifier.
    #[must_use]
    pub fn test_case(&self, id: &str) -> Option<&TestCase> {
        self.specifications
            .iter()
            .flat_map(|plan| plan.test_cases.iter())
            .find(|test_case| test_case.id.as_str() == id)
    }
}

// ============================================================================
// SECTION: Journey
// ============================================================================

/// State owned by one conformance journey.
pub struct Journey {
    /// Source resolving manifest and reference URIs.
    source: ManifestSource,
    /// Sink for pipeline events.
    events: Arc<dyn EventSink>,
    /// Macro evaluator bound to the journey clock.
    macros: MacroTable,
    /// Journey-wide token-name counter.
    namer: TokenNamer,
    /// Operator-selected API versions.
    api_versions: Vec<String>,
    /// Assertion catalogue URI.
    assertions_uri: String,
    /// Body-data catalogue URI.
    data_uri: String,
}

impl Journey {
    /// Creates a journey reading from `source` with the default catalogues.
    #[must_use]
    pub fn new(source: ManifestSource, events: Arc<dyn EventSink>, macros: MacroTable) -> Self {
        Self {
            source,
            events,
            macros,
            namer: TokenNamer::new(),
            api_versions: Vec::new(),
            assertions_uri: DEFAULT_ASSERTIONS_URI.to_string(),
            data_uri: DEFAULT_DATA_URI.to_string(),
        }
    }

    /// Sets the API versions used for script range filtering.
    #[must_use]
    pub fn with_api_versions(mut self, api_versions: Vec<String>) -> Self {
        self.api_versions = api_versions;
        self
    }

    /// Overrides the assertion and body-data catalogue URIs.
    #[must_use]
    pub fn with_references(mut self, assertions_uri: impl Into<String>, data_uri: impl Into<String>) -> Self {
        self.assertions_uri = assertions_uri.into();
        self.data_uri = data_uri.into();
        self
    }

    /// Returns the journey event sink.
    #[must_use]
    pub fn events(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }

    /// Compiles the test plan for every discovery item.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Compile`] for manifest, reference, filter,
    /// compilation and grouping failures.
    pub fn plan(
        &mut self,
        discovery: &DiscoveryModel,
        seed: &Context,
        validators: &ValidatorMap,
    ) -> Result<TestPlan, RunnerError> {
        let references = load_references(&self.source, &self.assertions_uri, &self.data_uri)?;
        let compiler = Compiler::new(self.macros.clone(), Arc::clone(&self.events))?;
        let mut plan = TestPlan::default();
        for item in &discovery.discovery_items {
            let specification = self.plan_item(item, seed, validators, &references, &compiler, &mut plan.manifest_bytes)?;
            plan.specifications.push(specification);
        }
        Ok(plan)
    }

    /// Returns the configured API versions, falling back to the specification version.
    fn version_context(&self, specification: &ApiSpecification) -> Option<Vec<String>> {
        if !self.api_versions.is_empty() {
            return Some(self.api_versions.clone());
        }
        let version = specification.version.trim();
        (!version.is_empty()).then(|| vec![version.to_string()])
    }

    /// Plans one discovery item.
    fn plan_item(
        &mut self,
        item: &DiscoveryItem,
        seed: &Context,
        validators: &ValidatorMap,
        references: &References,
        compiler: &Compiler,
        manifest_bytes: &mut Vec<u8>,
    ) -> Result<SpecificationPlan, RunnerError> {
        let specification = &item.api_specification;
        let schema_url = specification.schema_url();
        let spec_type = SpecType::from_schema_url(schema_url)
            .ok_or_else(|| CompileError::UnknownSpecification(schema_url.to_string()))?;

        let manifest_uri = if specification.manifest.trim().is_empty() {
            spec_type.default_manifest().to_string()
        } else {
            specification.manifest.clone()
        };
        let version_context = self.version_context(specification);
        let (manifest, bytes) = load_manifest_bytes(&self.source, &manifest_uri, version_context.as_deref())?;
        manifest_bytes.extend_from_slice(&bytes);

        let filter = EndpointFilter::new(spec_type)?;
        let scripts = filter.filter(&manifest.scripts, &item.endpoints);
        let scripts = filter_by_version(scripts, &specification.version, &self.api_versions)?;

        let mut context = seed.clone();
        item.seed_context(&mut context);
        if !self.api_versions.is_empty() {
            context.put_strings(API_VERSIONS_KEY, self.api_versions.clone());
        }

        let request = CompileRequest {
            specification,
            scripts: &scripts,
            references,
            context: &context,
            validator: validators.get(schema_url).cloned(),
        };
        let mut test_cases = compiler.compile(&request)?;
        inject_conditional_properties(&mut test_cases, &item.endpoints, self.events.as_ref())?;
        let token_groups = group_permissions(&permission_sets(&test_cases), &mut self.namer)?;
        inject_tokens(&mut test_cases, &token_groups);

        self.events.record(&PipelineEvent::info(
            TEST_PLAN_COMPILED_EVENT,
            specification.name.clone(),
            format!("{} test cases, {} token groups", test_cases.len(), token_groups.len()),
        ));
        Ok(SpecificationPlan {
            specification: specification.clone(),
            spec_type,
            manifest_uri,
            test_cases,
            token_groups,
            context,
        })
    }
}
