use crate::document::Document;
use crate::paths::{Operation, PathItem, PathTable};

impl Document {
    /// Produce a standards-clean OpenAPI 3.0.0 document for publication.
    ///
    /// Keeps only `openapi`, `info`, `servers`, `components` and `paths`;
    /// every operation is stripped to its standard fields and all dbgate
    /// extensions (`handler`, `db`, `webserver`, `import`) are omitted.
    pub fn publish(&self) -> Document {
        let mut paths = PathTable::default();
        for (key, item) in &self.paths {
            paths.insert(
                key.clone(),
                PathItem {
                    summary: item.summary.clone(),
                    description: item.description.clone(),
                    get: publish_operation(&item.get),
                    post: publish_operation(&item.post),
                    put: publish_operation(&item.put),
                    patch: publish_operation(&item.patch),
                    delete: publish_operation(&item.delete),
                    head: publish_operation(&item.head),
                    options: publish_operation(&item.options),
                    trace: publish_operation(&item.trace),
                },
            );
        }

        Document {
            openapi: Some("3.0.0".to_string()),
            info: self.info.clone(),
            servers: self.servers.clone(),
            paths,
            components: self.components.clone(),
            db: None,
            webserver: None,
            imports: Default::default(),
        }
    }
}

fn publish_operation(op: &Option<Operation>) -> Option<Operation> {
    op.as_ref().map(|op| Operation {
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        parameters: op.parameters.clone(),
        responses: op.responses.clone(),
        handler: None,
    })
}
