use std::collections::HashMap;

use regex_lite::Regex;

use crate::fault::Fault;

/// Where a parameter's raw value comes from at request time.
#[derive(Debug, Clone)]
pub enum Extract {
    /// The whole request body.
    Body,
    /// A request header, looked up by lowercase name.
    Header(String),
    /// A routing variable: a path capture or a query pair.
    Var(String),
}

/// One validation step applied to an extracted value.
///
/// Checks run in declaration order and the first failure wins; a passing
/// value flows through unchanged.
#[derive(Debug, Clone)]
pub enum Check {
    /// Unanchored regex match against the declared pattern.
    Pattern { regex: Regex, pattern: String },
    /// Literal `true` or `false`.
    Boolean,
    /// Integer parse plus inclusive bounds.
    IntegerRange { min: Option<i64>, max: Option<i64> },
    /// String length bounds.
    Length { min: Option<usize>, max: Option<usize> },
    /// Membership in the declared enum.
    OneOf(Vec<String>),
}

/// The compiled extraction + validation chain for one parameter.
#[derive(Debug, Clone)]
pub struct ParamPipeline {
    pub name: String,
    pub extract: Extract,
    pub checks: Vec<Check>,
}

/// Borrowed view of one request, as the dispatcher hands it to pipelines.
///
/// Header names are lowercased by the caller; `vars` holds query pairs
/// overlaid by path captures.
#[derive(Debug, Clone, Copy)]
pub struct RequestInput<'a> {
    pub vars: &'a HashMap<String, String>,
    pub headers: &'a HashMap<String, String>,
    pub body: &'a str,
}

impl ParamPipeline {
    /// Extract the raw value and run every check, yielding the value that
    /// becomes one positional SQL argument.
    pub fn run(&self, input: &RequestInput<'_>) -> Result<String, Fault> {
        let value = match &self.extract {
            Extract::Body => input.body.to_string(),
            Extract::Header(name) => {
                let found = input.headers.get(name).filter(|v| !v.is_empty());
                match found {
                    Some(v) => v.clone(),
                    None => {
                        return Err(Fault::bad_request(format!("missing header {}", self.name)))
                    }
                }
            }
            Extract::Var(name) => {
                // An empty routed value (`?name=`) reads as absent, same as
                // an empty header.
                match input.vars.get(name).filter(|v| !v.is_empty()) {
                    Some(v) => v.clone(),
                    None => {
                        return Err(Fault::bad_request(format!(
                            "missing parameter {}",
                            self.name
                        )))
                    }
                }
            }
        };

        for check in &self.checks {
            check.apply(&self.name, &value)?;
        }
        Ok(value)
    }
}

impl Check {
    fn apply(&self, name: &str, value: &str) -> Result<(), Fault> {
        match self {
            Check::Pattern { regex, pattern } => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(Fault::bad_request(format!(
                        "param {name} must match \"{pattern}\""
                    )))
                }
            }
            Check::Boolean => {
                if value == "true" || value == "false" {
                    Ok(())
                } else {
                    Err(Fault::bad_request(format!(
                        "{name} must match \"true\" or \"false\""
                    )))
                }
            }
            Check::IntegerRange { min, max } => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| Fault::bad_request(format!("{name} must be an integer")))?;
                let below = min.is_some_and(|m| parsed < m);
                let above = max.is_some_and(|m| parsed > m);
                if below || above {
                    return Err(Fault::bad_request(format!(
                        "{name} out of bounds [{}, {}]",
                        bound(*min),
                        bound(*max)
                    )));
                }
                Ok(())
            }
            Check::Length { min, max } => {
                let len = value.chars().count();
                let below = min.is_some_and(|m| len < m);
                let above = max.is_some_and(|m| len > m);
                if below || above {
                    return Err(Fault::bad_request(format!(
                        "{name} length out of bounds [{}, {}]",
                        bound_usize(*min),
                        bound_usize(*max)
                    )));
                }
                Ok(())
            }
            Check::OneOf(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(Fault::bad_request(format!(
                        "{name} not in {}",
                        allowed.join(", ")
                    )))
                }
            }
        }
    }
}

fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn bound_usize(value: Option<usize>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        vars: &'a HashMap<String, String>,
        headers: &'a HashMap<String, String>,
        body: &'a str,
    ) -> RequestInput<'a> {
        RequestInput {
            vars,
            headers,
            body,
        }
    }

    fn var_pipeline(name: &str, checks: Vec<Check>) -> ParamPipeline {
        ParamPipeline {
            name: name.to_string(),
            extract: Extract::Var(name.to_string()),
            checks,
        }
    }

    #[test]
    fn extracts_body_verbatim() {
        let vars = HashMap::new();
        let headers = HashMap::new();
        let pipeline = ParamPipeline {
            name: "payload".to_string(),
            extract: Extract::Body,
            checks: vec![],
        };
        let value = pipeline
            .run(&input(&vars, &headers, "{\"a\":1}"))
            .expect("body extraction");
        assert_eq!(value, "{\"a\":1}");
    }

    #[test]
    fn missing_header_is_a_bad_request() {
        let vars = HashMap::new();
        let headers = HashMap::new();
        let pipeline = ParamPipeline {
            name: "X-Token".to_string(),
            extract: Extract::Header("x-token".to_string()),
            checks: vec![],
        };
        let fault = pipeline
            .run(&input(&vars, &headers, ""))
            .expect_err("should fail");
        assert_eq!(fault.status, 400);
        assert_eq!(fault.message, "missing header X-Token");
    }

    #[test]
    fn empty_header_counts_as_missing() {
        let vars = HashMap::new();
        let mut headers = HashMap::new();
        headers.insert("x-token".to_string(), String::new());
        let pipeline = ParamPipeline {
            name: "X-Token".to_string(),
            extract: Extract::Header("x-token".to_string()),
            checks: vec![],
        };
        assert!(pipeline.run(&input(&vars, &headers, "")).is_err());
    }

    #[test]
    fn empty_var_counts_as_missing() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), String::new());
        let headers = HashMap::new();
        let pipeline = var_pipeline("name", vec![]);
        let fault = pipeline
            .run(&input(&vars, &headers, ""))
            .expect_err("should fail");
        assert_eq!(fault.status, 400);
        assert_eq!(fault.message, "missing parameter name");
    }

    #[test]
    fn integer_check_rejects_non_numeric() {
        let mut vars = HashMap::new();
        vars.insert("id".to_string(), "abc".to_string());
        let headers = HashMap::new();
        let pipeline = var_pipeline(
            "id",
            vec![Check::IntegerRange {
                min: None,
                max: None,
            }],
        );
        let fault = pipeline
            .run(&input(&vars, &headers, ""))
            .expect_err("should fail");
        assert_eq!(fault.message, "id must be an integer");
    }

    #[test]
    fn integer_bounds_are_inclusive() {
        let headers = HashMap::new();
        let pipeline = var_pipeline(
            "n",
            vec![Check::IntegerRange {
                min: Some(1),
                max: Some(10),
            }],
        );
        for (value, ok) in [("1", true), ("10", true), ("0", false), ("11", false)] {
            let mut vars = HashMap::new();
            vars.insert("n".to_string(), value.to_string());
            assert_eq!(pipeline.run(&input(&vars, &headers, "")).is_ok(), ok);
        }
    }

    #[test]
    fn boolean_check_accepts_only_literals() {
        let headers = HashMap::new();
        let pipeline = var_pipeline("flag", vec![Check::Boolean]);
        for (value, ok) in [("true", true), ("false", true), ("TRUE", false), ("1", false)] {
            let mut vars = HashMap::new();
            vars.insert("flag".to_string(), value.to_string());
            assert_eq!(pipeline.run(&input(&vars, &headers, "")).is_ok(), ok);
        }
    }

    #[test]
    fn enum_failure_names_the_allowed_set() {
        let mut vars = HashMap::new();
        vars.insert("state".to_string(), "paused".to_string());
        let headers = HashMap::new();
        let pipeline = var_pipeline(
            "state",
            vec![Check::OneOf(vec![
                "active".to_string(),
                "retired".to_string(),
            ])],
        );
        let fault = pipeline
            .run(&input(&vars, &headers, ""))
            .expect_err("should fail");
        assert_eq!(fault.message, "state not in active, retired");
    }

    #[test]
    fn checks_run_in_order_and_first_failure_wins() {
        let mut vars = HashMap::new();
        vars.insert("code".to_string(), "zz".to_string());
        let headers = HashMap::new();
        let pipeline = var_pipeline(
            "code",
            vec![
                Check::Pattern {
                    regex: Regex::new("^[0-9]+$").expect("valid pattern"),
                    pattern: "^[0-9]+$".to_string(),
                },
                Check::IntegerRange {
                    min: Some(1),
                    max: None,
                },
            ],
        );
        let fault = pipeline
            .run(&input(&vars, &headers, ""))
            .expect_err("should fail");
        assert_eq!(fault.message, "param code must match \"^[0-9]+$\"");
    }
}
