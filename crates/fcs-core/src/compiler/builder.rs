// crates/fcs-core/src/compiler/builder.rs
// ============================================================================
// Module: Test-Case Builder
// Description: Compiles filtered scripts into concrete test cases.
// Purpose: Resolve parameters, macros and assertions against the context.
// Dependencies: crate::model, crate::events, crate::compiler::macros, regex
// ============================================================================

//! ## Overview
//! For each script a local [`Context`] is built from the parameter map:
//! `consentId` is copied verbatim, `$fn:NAME(ARGS)` values invoke a macro,
//! `$name` values are looked up in the parent context, then the reference
//! store, then the local context being built. The local context is combined
//! with the parent (local values win) and every `$name` token in the request
//! is replaced leniently; unresolved tokens are reported as events and left
//! for the runner's strict pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;

use crate::compiler::CompileError;
use crate::compiler::macros::BuiltinMacro;
use crate::compiler::macros::MacroTable;
use crate::events::EventSink;
use crate::events::PipelineEvent;
use crate::interfaces::Validator;
use crate::model::context::Context;
use crate::model::context::SubstitutionMode;
use crate::model::discovery::ApiSpecification;
use crate::model::expect::Expect;
use crate::model::expect::Match;
use crate::model::identifiers::TestCaseId;
use crate::model::script::References;
use crate::model::script::Script;
use crate::model::spec_type::SpecType;
use crate::model::testcase::INTERACTION_ID_PLACEHOLDER;
use crate::model::testcase::Input;
use crate::model::testcase::TestCase;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Pattern for macro invocations.
const CALL_PATTERN: &str = r"^\$fn:([A-Za-z_][A-Za-z0-9_]*)\(([^)]*)\)$";

/// Prefix marking a macro invocation.
const CALL_PREFIX: &str = "$fn:";

/// Parameter copied into the local context without interpretation.
const CONSENT_ID_KEY: &str = "consentId";

/// Parameter renamed on store.
const TOKEN_REQUEST_SCOPE_KEY: &str = "tokenRequestScope";

/// Replacement name for [`TOKEN_REQUEST_SCOPE_KEY`].
const TOKEN_SCOPE_KEY: &str = "tokenScope";

/// Local context key holding the request body template.
const POST_DATA_KEY: &str = "postData";

/// Local context key holding required permissions.
pub(crate) const PERMISSIONS_KEY: &str = "permissions";

/// Local context key holding excluded permissions.
pub(crate) const PERMISSIONS_EXCLUDED_KEY: &str = "permissions-excluded";

/// Event emitted for tokens left unresolved by the lenient pass.
const CONTEXT_VALUE_MISSING_EVENT: &str = "context_value_missing";

// ============================================================================
// SECTION: Request
// ============================================================================

/// Inputs for compiling the scripts of one API specification.
pub struct CompileRequest<'a> {
    /// Specification the scripts belong to.
    pub specification: &'a ApiSpecification,
    /// Filtered, version-checked scripts.
    pub scripts: &'a [Script],
    /// Merged assertion and body-data references.
    pub references: &'a References,
    /// Journey-wide parent context.
    pub context: &'a Context,
    /// Response validator attached to every test case.
    pub validator: Option<Arc<dyn Validator>>,
}

// ============================================================================
// SECTION: Compiler
// ============================================================================

/// Script-to-test-case compiler.
pub struct Compiler {
    /// Compiled macro invocation pattern.
    call_pattern: Regex,
    /// Macro evaluator.
    macros: MacroTable,
    /// Event sink for compile-time warnings.
    events: Arc<dyn EventSink>,
}

impl Compiler {
    /// Creates a compiler.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidPattern`] when the call pattern does not compile.
    pub fn new(macros: MacroTable, events: Arc<dyn EventSink>) -> Result<Self, CompileError> {
        let call_pattern = Regex::new(CALL_PATTERN).map_err(|err| CompileError::InvalidPattern(err.to_string()))?;
        Ok(Self {
            call_pattern,
            macros,
            events,
        })
    }

    /// Compiles every script of the request in order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownSpecification`] when the schema URL is
    /// not a known family, and the first script-level error otherwise.
    pub fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<TestCase>, CompileError> {
        let schema_url = request.specification.schema_url();
        let spec_type = SpecType::from_schema_url(schema_url)
            .ok_or_else(|| CompileError::UnknownSpecification(schema_url.to_string()))?;
        request.scripts.iter().map(|script| self.compile_script(script, spec_type, request)).collect()
    }

    /// Compiles a single script.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] naming the script on macro, reference or
    /// context failures.
    pub fn compile_script(
        &self,
        script: &Script,
        spec_type: SpecType,
        request: &CompileRequest<'_>,
    ) -> Result<TestCase, CompileError> {
        let mut local = self.local_context(script, request.context, request.references)?;
        let mut combined = local.clone();
        combined.layer_over(request.context);

        let (expect, expect_one_of) = build_expectations(script, request.references)?;
        let method = script.method.to_ascii_uppercase();
        let signed = spec_type == SpecType::Payments && method == "POST";
        let mut test_case = TestCase {
            id: TestCaseId::new(script.id.clone()),
            name: script.description.clone(),
            purpose: script.detail.clone(),
            detail: script.detail.clone(),
            ref_uri: script.ref_uri.clone(),
            api_name: request.specification.name.clone(),
            api_version: request.specification.version.clone(),
            input: Input {
                method,
                endpoint: script.uri.clone(),
                headers: request_headers(script),
                remove_headers: script.remove_headers.clone(),
                remove_claims: script.remove_claims.clone(),
                request_body: script.body.clone(),
                query_parameters: script.query_parameters.clone(),
                jws_sig: signed,
                idempotency_key: signed,
            },
            expect,
            expect_one_of,
            context: Context::new(),
            use_client_credentials: script.use_ccg_token,
            validate_signature: script.validate_signature,
            validator: request.validator.clone(),
        };

        let missing = test_case.apply_context(&combined, SubstitutionMode::Lenient).map_err(|err| {
            CompileError::Context {
                script: script.id.clone(),
                message: err.to_string(),
            }
        })?;
        for name in missing {
            self.events.record(&PipelineEvent::warn(
                CONTEXT_VALUE_MISSING_EVENT,
                script.id.clone(),
                format!("unresolved context value ${name}"),
            ));
        }
        local.delete(POST_DATA_KEY);
        test_case.context = local;
        Ok(test_case)
    }

    /// Builds the per-script local context from its parameter map.
    fn local_context(
        &self,
        script: &Script,
        parent: &Context,
        references: &References,
    ) -> Result<Context, CompileError> {
        let mut local = Context::new();
        for (key, value) in &script.parameters {
            let key = if key == TOKEN_REQUEST_SCOPE_KEY { TOKEN_SCOPE_KEY } else { key.as_str() };
            if key == CONSENT_ID_KEY {
                local.put_string(key, value.clone());
            } else if value.starts_with(CALL_PREFIX) {
                let result = self.invoke(script, value)?;
                local.put_string(key, result);
            } else if let Some(name) = value.strip_prefix('$') {
                let resolved = lookup(name, parent, references, &local).unwrap_or_else(|| value.clone());
                local.put_string(key, resolved);
            } else {
                local.put_string(key, value.clone());
            }
        }
        if !script.permissions.is_empty() {
            local.put_strings(PERMISSIONS_KEY, script.permissions.clone());
        }
        if !script.permissions_excluded.is_empty() {
            local.put_strings(PERMISSIONS_EXCLUDED_KEY, script.permissions_excluded.clone());
        }
        Ok(local)
    }

    /// Parses and evaluates a `$fn:NAME(ARGS)` value.
    fn invoke(&self, script: &Script, call: &str) -> Result<String, CompileError> {
        let captures = self.call_pattern.captures(call.trim()).ok_or_else(|| {
            CompileError::MalformedFunctionCall {
                script: script.id.clone(),
                call: call.to_string(),
            }
        })?;
        let name = captures.get(1).map_or("", |found| found.as_str());
        let args: Vec<String> = captures
            .get(2)
            .map_or("", |found| found.as_str())
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect();
        let function = BuiltinMacro::from_name(name).ok_or_else(|| CompileError::UnknownMacro {
            script: script.id.clone(),
            name: name.to_string(),
        })?;
        self.macros.invoke(function, &args).map_err(|err| CompileError::Macro {
            script: script.id.clone(),
            message: err.to_string(),
        })
    }
}

/// Resolves `$name` from the parent context, then references, then local values.
fn lookup(name: &str, parent: &Context, references: &References, local: &Context) -> Option<String> {
    parent
        .render(name)
        .filter(|value| !value.is_empty())
        .or_else(|| references.body_data(name).map(str::to_string))
        .or_else(|| local.render(name).filter(|value| !value.is_empty()))
}

/// Fixed headers followed by script headers.
fn request_headers(script: &Script) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("x-fapi-financial-id".to_string(), "$x-fapi-financial-id".to_string());
    headers.insert("x-fapi-interaction-id".to_string(), INTERACTION_ID_PLACEHOLDER.to_string());
    headers.insert("x-fcs-testcase-id".to_string(), script.id.clone());
    headers.insert("x-fapi-customer-ip-address".to_string(), "$x-fapi-customer-ip-address".to_string());
    for (name, value) in &script.headers {
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Clones referenced assertions into the primary and alternative expectations.
fn build_expectations(script: &Script, references: &References) -> Result<(Expect, Vec<Expect>), CompileError> {
    let mut expect = Expect {
        schema_validation: script.schema_check,
        ..Expect::default()
    };
    for name in &script.asserts {
        let assertion = clone_assertion(script, references, name)?;
        if assertion.status_code != 0 {
            expect.status_code = assertion.status_code;
        }
        expect.matches.extend(assertion.matches);
        if let Some(context_put) = assertion.context_put {
            for extraction in context_put.matches {
                expect.push_context_put(extraction);
            }
        }
    }
    let mut expect_one_of = Vec::with_capacity(script.asserts_one_of.len());
    for name in &script.asserts_one_of {
        expect_one_of.push(clone_assertion(script, references, name)?);
    }
    if let Some(directive) = &script.keep_context_on_success
        && directive.is_complete()
    {
        expect.push_context_put(Match::context_extract(directive.name.clone(), directive.value.clone()));
    }
    Ok((expect, expect_one_of))
}

/// Clones the expectation of a named assertion.
fn clone_assertion(script: &Script, references: &References, name: &str) -> Result<Expect, CompileError> {
    references.expect(name).cloned().ok_or_else(|| CompileError::MissingReference {
        script: script.id.clone(),
        reference: name.to_string(),
    })
}
