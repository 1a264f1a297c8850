use dbgate_spec::{Document, HandlerConfig, Operation, ParameterObject, SchemaObject, Verb};
use regex_lite::Regex;

use crate::error::CompileError;
use crate::pipeline::{Check, Extract, ParamPipeline};

/// One operation compiled into its request-time form: the parameter
/// pipelines, the SQL call text, the response shaping and the status-routed
/// error wiring. Everything here is computed once at startup.
#[derive(Debug, Clone)]
pub struct CompiledOperation {
    pub path: String,
    pub verb: Verb,
    pub pipelines: Vec<ParamPipeline>,
    pub sql: String,
    pub max_age: i64,
    pub content_type: String,
    pub error_responses: Vec<ErrorRoute>,
}

/// A declared Error-Shape response: faults with this status are serialized
/// into the declared content type instead of an empty body.
#[derive(Debug, Clone)]
pub struct ErrorRoute {
    pub status: u16,
    pub content_type: String,
}

impl CompiledOperation {
    pub fn error_route(&self, status: u16) -> Option<&ErrorRoute> {
        self.error_responses.iter().find(|r| r.status == status)
    }
}

/// Compile every handler-bearing operation of a resolved document.
///
/// Operations without a `handler:` section are skipped; the output order
/// follows the path table and, within one path, verb order.
pub fn compile_document(document: &Document) -> Result<Vec<CompiledOperation>, CompileError> {
    let mut compiled = Vec::new();
    for (path, item) in &document.paths {
        for (verb, op) in item.operations() {
            if let Some(handler) = &op.handler {
                let op = compile_operation(path, verb, op, handler)?;
                tracing::debug!(path = %op.path, verb = op.verb.as_str(), sql = %op.sql, "compiled operation");
                compiled.push(op);
            }
        }
    }
    Ok(compiled)
}

fn compile_operation(
    path: &str,
    verb: Verb,
    op: &Operation,
    handler: &HandlerConfig,
) -> Result<CompiledOperation, CompileError> {
    if !is_function_name(&handler.function) {
        return Err(CompileError::InvalidFunction(handler.function.clone()));
    }

    let mut pipelines = Vec::with_capacity(op.parameters.len());
    let mut casts = Vec::with_capacity(op.parameters.len());
    for parameter in &op.parameters {
        let inline = match parameter {
            dbgate_spec::Parameter::Inline(obj) => obj,
            dbgate_spec::Parameter::Reference { reference } => {
                return Err(CompileError::UnresolvedParameter(reference.0.clone()));
            }
        };
        pipelines.push(compile_parameter(inline)?);
        casts.push(sql_cast(inline));
    }

    let sql = build_sql(&handler.function, &casts);
    let content_type = success_content_type(op);
    let error_responses = compile_error_routes(op)?;

    Ok(CompiledOperation {
        path: path.to_string(),
        verb,
        pipelines,
        sql,
        max_age: handler.max_age,
        content_type,
        error_responses,
    })
}

fn compile_parameter(param: &ParameterObject) -> Result<ParamPipeline, CompileError> {
    let extract = match param.location.as_str() {
        "body" => Extract::Body,
        "header" => Extract::Header(param.name.to_lowercase()),
        "path" | "query" => Extract::Var(param.name.clone()),
        other => {
            return Err(CompileError::InvalidLocation {
                name: param.name.clone(),
                location: other.to_string(),
            });
        }
    };

    let mut checks = Vec::new();
    if let Some(schema) = param.schema.as_ref().and_then(|s| s.as_inline()) {
        compile_checks(&param.name, schema, &mut checks)?;
    }

    Ok(ParamPipeline {
        name: param.name.clone(),
        extract,
        checks,
    })
}

/// Checks compile in a fixed order: pattern, then the type check, then the
/// enum. That order is what requests observe when several constraints fail
/// at once.
fn compile_checks(
    name: &str,
    schema: &SchemaObject,
    checks: &mut Vec<Check>,
) -> Result<(), CompileError> {
    if let Some(pattern) = &schema.pattern {
        let regex = Regex::new(pattern).map_err(|e| CompileError::InvalidPattern {
            name: name.to_string(),
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        checks.push(Check::Pattern {
            regex,
            pattern: pattern.clone(),
        });
    }

    match schema.schema_type.as_deref() {
        Some("integer") => {
            let min = schema.minimum.map(|m| {
                if schema.exclusive_minimum {
                    m + 1
                } else {
                    m
                }
            });
            let max = schema.maximum.map(|m| {
                if schema.exclusive_maximum {
                    m - 1
                } else {
                    m
                }
            });
            checks.push(Check::IntegerRange { min, max });
        }
        Some("boolean") => {
            checks.push(Check::Boolean);
        }
        Some("string") => {
            if schema.min_length.is_some() || schema.max_length.is_some() {
                // maxLength has always behaved as an exclusive bound here;
                // documents in the wild depend on it.
                let min = schema.min_length.map(|m| m.max(0) as usize);
                let max = schema.max_length.map(|m| (m - 1).max(0) as usize);
                checks.push(Check::Length { min, max });
            }
        }
        _ => {}
    }

    if !schema.enum_values.is_empty() {
        checks.push(Check::OneOf(schema.enum_values.clone()));
    }
    Ok(())
}

/// The SQL text for one call: `SELECT f($1::t1, ..., $n::tn)::text`, one
/// positional argument per declared parameter, in declaration order.
///
/// Every argument binds as text on the wire; the explicit casts hand the
/// server the declared parameter types so function resolution finds
/// `f(integer)` rather than `f(text)`, and the outer cast makes the scalar
/// result decode as text whatever type the function returns.
fn build_sql(function: &str, casts: &[&str]) -> String {
    let args: Vec<String> = casts
        .iter()
        .enumerate()
        .map(|(i, cast)| format!("${}::{}", i + 1, cast))
        .collect();
    format!("SELECT {}({})::text", function, args.join(", "))
}

/// The SQL type a parameter's argument is cast to. Validated types map to
/// their SQL counterparts; everything else stays text.
fn sql_cast(param: &ParameterObject) -> &'static str {
    let schema_type = param
        .schema
        .as_ref()
        .and_then(|s| s.as_inline())
        .and_then(|s| s.schema_type.as_deref());
    match schema_type {
        Some("integer") => "integer",
        Some("boolean") => "boolean",
        _ => "text",
    }
}

/// A function name is a dotted identifier: letters, digits, `_` and `.`,
/// not starting with a digit. Anything else never reaches the database.
fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Success content type: handler override first, then the first declared
/// content type of the 200 response, then `text/plain`.
fn success_content_type(op: &Operation) -> String {
    if let Some(ct) = op.handler.as_ref().and_then(|h| h.content_type.clone()) {
        return ct;
    }
    op.responses
        .get("200")
        .and_then(|r| r.as_inline())
        .and_then(|r| r.content.keys().next().cloned())
        .unwrap_or_else(|| "text/plain".to_string())
}

fn compile_error_routes(op: &Operation) -> Result<Vec<ErrorRoute>, CompileError> {
    let mut routes = Vec::new();
    for (key, response) in &op.responses {
        let status: u16 = key
            .parse()
            .ok()
            .filter(|s| (100..=599).contains(s))
            .ok_or_else(|| CompileError::InvalidStatusCode(key.clone()))?;

        let Some(inline) = response.as_inline() else {
            continue;
        };
        for (content_type, media) in &inline.content {
            let is_error = media.schema.as_ref().is_some_and(|s| s.is_error_shape());
            if is_error && crate::fault::is_serializable_content_type(content_type) {
                routes.push(ErrorRoute {
                    status,
                    content_type: content_type.clone(),
                });
                break;
            }
        }
    }
    Ok(routes)
}
