use std::collections::HashMap;

use bytes::Bytes;
use dbgate_compiler::{
    compile_document, serialize_fault, CompileError, CompiledOperation, Fault, RequestInput,
};
use dbgate_spec::Document;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use sqlx::PgPool;
use thiserror::Error;

use crate::router::{RouteMatch, Router};

/// Errors building a gateway from a loaded document.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("failed to serialize published document: {0}")]
    Publish(#[from] serde_yaml::Error),
}

/// Shared gateway state: the route table, the compiled operations, the
/// connection pool and the published document served on the reserved
/// endpoint. Built once, then shared across connections.
pub struct Gateway {
    router: Router,
    operations: Vec<CompiledOperation>,
    pool: PgPool,
    openapi: String,
}

impl Gateway {
    /// Compile a resolved document and wire its operations into the router.
    pub fn new(document: &Document, pool: PgPool) -> Result<Self, GatewayError> {
        let operations = compile_document(document)?;
        let mut router = Router::new();
        for (index, op) in operations.iter().enumerate() {
            router.insert(&op.path, op.verb.as_str(), index);
        }
        let openapi = serde_yaml::to_string(&document.publish())?;
        Ok(Gateway {
            router,
            operations,
            pool,
            openapi,
        })
    }

    pub fn route_count(&self) -> usize {
        self.operations.len()
    }

    /// Handle one request end to end: route, validate, call the stored
    /// function, shape the response.
    pub async fn handle<B: Body>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        let query = req.uri().query().map(str::to_string);

        if let Some(rest) = path.strip_prefix("/__dbgate/") {
            return self.reserved_endpoint(rest, &method);
        }

        let headers: HashMap<String, String> = req
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();

        let (index, mut vars) = match self.router.lookup(&path, &method) {
            RouteMatch::Found { index, vars } => (index, vars),
            RouteMatch::MethodNotAllowed(allowed) => return method_not_allowed(&allowed),
            RouteMatch::NotFound => return plain_status(StatusCode::NOT_FOUND),
        };
        let operation = &self.operations[index];

        // Query pairs merge under the path captures; a capture shadows a
        // query pair of the same name.
        if let Some(query) = &query {
            for (key, value) in parse_query(query) {
                vars.entry(key).or_insert(value);
            }
        }

        let body_bytes = match req.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => return plain_status(StatusCode::BAD_REQUEST),
        };
        let body = match std::str::from_utf8(&body_bytes) {
            Ok(s) => s,
            Err(_) => {
                let fault = Fault::bad_request("request body is not valid UTF-8");
                return fault_response(operation, fault);
            }
        };

        let input = RequestInput {
            vars: &vars,
            headers: &headers,
            body,
        };
        let mut args = Vec::with_capacity(operation.pipelines.len());
        for pipeline in &operation.pipelines {
            match pipeline.run(&input) {
                Ok(value) => args.push(value),
                Err(fault) => return fault_response(operation, fault),
            }
        }

        match self.execute(operation, &args).await {
            Ok(Some(payload)) => success_response(operation, payload),
            Ok(None) => fault_response(operation, Fault::not_found()),
            Err(fault) => fault_response(operation, fault),
        }
    }

    /// Run the operation's compiled SQL call and unwrap the scalar; the
    /// compiled text casts the result to text so it decodes uniformly.
    /// A missing row and a SQL NULL both read as "nothing to return".
    async fn execute(
        &self,
        operation: &CompiledOperation,
        args: &[String],
    ) -> Result<Option<String>, Fault> {
        let mut query = sqlx::query_scalar::<_, Option<String>>(&operation.sql);
        for arg in args {
            query = query.bind(arg);
        }
        let row = query.fetch_optional(&self.pool).await.map_err(|e| {
            tracing::error!(sql = %operation.sql, error = %e, "query failed");
            Fault::internal("database error")
        })?;
        Ok(row.flatten())
    }

    /// The reserved surface under `/__dbgate/`: liveness and the published
    /// document. GET only.
    fn reserved_endpoint(&self, rest: &str, method: &str) -> Response<Full<Bytes>> {
        if method != "GET" {
            return method_not_allowed(&["GET".to_string()]);
        }
        match rest {
            "health" => {
                let body = serde_json::json!({
                    "status": "ok",
                    "routes": self.operations.len(),
                });
                response(
                    StatusCode::OK,
                    Some("application/json"),
                    Bytes::from(body.to_string()),
                )
            }
            "openapi" => response(
                StatusCode::OK,
                Some("text/yaml"),
                Bytes::from(self.openapi.clone()),
            ),
            _ => plain_status(StatusCode::NOT_FOUND),
        }
    }
}

/// Route a fault through the operation's declared error responses: a
/// declared Error-Shape response for this status gets a serialized body,
/// anything else answers with the bare status.
fn fault_response(operation: &CompiledOperation, fault: Fault) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(fault.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match operation.error_route(fault.status) {
        Some(route) => {
            let body = serialize_fault(&fault, &route.content_type);
            response(status, Some(&route.content_type), Bytes::from(body))
        }
        None => {
            tracing::warn!(status = fault.status, message = %fault.message, "undeclared fault status");
            response(status, None, Bytes::new())
        }
    }
}

fn success_response(operation: &CompiledOperation, payload: String) -> Response<Full<Bytes>> {
    let mut resp = response(
        StatusCode::OK,
        Some(&operation.content_type),
        Bytes::from(payload),
    );
    let directive = match operation.max_age {
        n if n < 0 => Some("no-cache".to_string()),
        0 => None,
        n => Some(format!("max-age={n}")),
    };
    if let Some(directive) = directive {
        if let Ok(value) = HeaderValue::from_str(&directive) {
            resp.headers_mut().insert(CACHE_CONTROL, value);
        }
    }
    resp
}

fn method_not_allowed(allowed: &[String]) -> Response<Full<Bytes>> {
    let mut resp = plain_status(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
        resp.headers_mut().insert(ALLOW, value);
    }
    resp
}

fn plain_status(status: StatusCode) -> Response<Full<Bytes>> {
    response(status, None, Bytes::new())
}

fn response(status: StatusCode, content_type: Option<&str>, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    if let Some(ct) = content_type {
        if let Ok(value) = HeaderValue::from_str(ct) {
            resp.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    resp
}

/// Split a raw query string into decoded pairs. A key without `=` maps to
/// the empty string.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

/// Form-style percent decoding: `+` is a space, `%XX` is a byte, and a
/// malformed escape passes through verbatim.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
