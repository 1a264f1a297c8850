use std::collections::HashMap;

/// Result of matching a request against the route table.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch {
    /// A route matched: the operation index plus the captured path variables.
    Found {
        index: usize,
        vars: HashMap<String, String>,
    },
    /// The path exists but not under this method; carries the Allow set.
    MethodNotAllowed(Vec<String>),
    NotFound,
}

/// Path router over the compiled operations.
///
/// Templates are segment trees: a literal segment matches itself, a
/// `{name}` segment captures one segment. A literal child always wins over
/// a capture at the same position, with backtracking when the literal
/// branch dead-ends. Inserting the same path and method twice keeps the
/// later operation.
#[derive(Debug, Default)]
pub struct Router {
    root: Node,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    capture: Option<(String, Box<Node>)>,
    /// Method name -> operation index, present only on terminal nodes.
    ops: HashMap<String, usize>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Register one operation under a path template and method.
    pub fn insert(&mut self, path: &str, method: &str, index: usize) {
        let mut node = &mut self.root;
        for segment in segments(path) {
            if let Some(name) = capture_name(segment) {
                let (existing, child) = node
                    .capture
                    .get_or_insert_with(|| (name.to_string(), Box::new(Node::default())));
                // Two templates disagreeing on the variable name collapse to
                // one node; the later name wins, matching last-wins paths.
                if existing.as_str() != name {
                    *existing = name.to_string();
                }
                node = child.as_mut();
            } else {
                node = node.children.entry(segment.to_string()).or_default();
            }
        }
        node.ops.insert(method.to_string(), index);
    }

    /// Match a concrete request path and method.
    pub fn lookup(&self, path: &str, method: &str) -> RouteMatch {
        let segments: Vec<&str> = segments(path).collect();
        let mut vars = HashMap::new();
        let Some(node) = find(&self.root, &segments, &mut vars) else {
            return RouteMatch::NotFound;
        };
        match node.ops.get(method) {
            Some(index) => RouteMatch::Found {
                index: *index,
                vars,
            },
            None => {
                let mut allowed: Vec<String> = node.ops.keys().cloned().collect();
                allowed.sort();
                RouteMatch::MethodNotAllowed(allowed)
            }
        }
    }
}

/// Depth-first match, literal child before capture, undoing captured
/// variables on backtrack.
fn find<'a>(
    node: &'a Node,
    segments: &[&str],
    vars: &mut HashMap<String, String>,
) -> Option<&'a Node> {
    let Some((head, rest)) = segments.split_first() else {
        return if node.ops.is_empty() { None } else { Some(node) };
    };

    if let Some(child) = node.children.get(*head) {
        if let Some(found) = find(child, rest, vars) {
            return Some(found);
        }
    }

    if let Some((name, child)) = &node.capture {
        let previous = vars.insert(name.clone(), (*head).to_string());
        if let Some(found) = find(child, rest, vars) {
            return Some(found);
        }
        match previous {
            Some(value) => vars.insert(name.clone(), value),
            None => vars.remove(name),
        };
    }

    None
}

/// Non-empty path segments; leading, trailing and doubled slashes vanish,
/// so `/users/`, `users` and `//users` route alike.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn capture_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(m: RouteMatch) -> (usize, HashMap<String, String>) {
        match m {
            RouteMatch::Found { index, vars } => (index, vars),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn matches_static_path() {
        let mut router = Router::new();
        router.insert("/users", "GET", 0);
        let (index, vars) = found(router.lookup("/users", "GET"));
        assert_eq!(index, 0);
        assert!(vars.is_empty());
    }

    #[test]
    fn captures_path_variables() {
        let mut router = Router::new();
        router.insert("/users/{id}/posts/{post}", "GET", 3);
        let (index, vars) = found(router.lookup("/users/42/posts/7", "GET"));
        assert_eq!(index, 3);
        assert_eq!(vars["id"], "42");
        assert_eq!(vars["post"], "7");
    }

    #[test]
    fn static_segment_wins_over_capture() {
        let mut router = Router::new();
        router.insert("/users/{id}", "GET", 0);
        router.insert("/users/me", "GET", 1);
        let (index, vars) = found(router.lookup("/users/me", "GET"));
        assert_eq!(index, 1);
        assert!(vars.is_empty());

        let (index, vars) = found(router.lookup("/users/42", "GET"));
        assert_eq!(index, 0);
        assert_eq!(vars["id"], "42");
    }

    #[test]
    fn backtracks_when_static_branch_dead_ends() {
        let mut router = Router::new();
        router.insert("/files/static", "GET", 0);
        router.insert("/files/{name}/meta", "GET", 1);
        // "static" matches the literal child but that branch has no /meta,
        // so the capture branch must be retried.
        let (index, vars) = found(router.lookup("/files/static/meta", "GET"));
        assert_eq!(index, 1);
        assert_eq!(vars["name"], "static");
    }

    #[test]
    fn method_not_allowed_lists_methods() {
        let mut router = Router::new();
        router.insert("/users", "GET", 0);
        router.insert("/users", "POST", 1);
        match router.lookup("/users", "DELETE") {
            RouteMatch::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec!["GET", "POST"]);
            }
            other => panic!("unexpected match: {other:?}"),
        }
    }

    #[test]
    fn unknown_path_is_not_found() {
        let mut router = Router::new();
        router.insert("/users", "GET", 0);
        assert_eq!(router.lookup("/orders", "GET"), RouteMatch::NotFound);
        // A strict prefix of a route is not a route.
        assert_eq!(router.lookup("/", "GET"), RouteMatch::NotFound);
    }

    #[test]
    fn trailing_and_doubled_slashes_route_alike() {
        let mut router = Router::new();
        router.insert("/users/{id}", "GET", 0);
        let (index, _) = found(router.lookup("/users/42/", "GET"));
        assert_eq!(index, 0);
        let (index, _) = found(router.lookup("//users//42", "GET"));
        assert_eq!(index, 0);
    }

    #[test]
    fn duplicate_insert_keeps_last_operation() {
        let mut router = Router::new();
        router.insert("/users", "GET", 0);
        router.insert("/users", "GET", 5);
        let (index, _) = found(router.lookup("/users", "GET"));
        assert_eq!(index, 5);
    }
}
