use std::collections::HashSet;

use crate::components::Components;
use crate::document::Document;
use crate::error::LoadError;
use crate::paths::{Parameter, PathTable, Verb};
use crate::response::Response;
use crate::schema::Schema;

/// Transient state for one resolution pass over the merged document.
///
/// The in-flight set short-circuits a reference that is already being
/// resolved on the current call stack: a schema legitimately referring to an
/// ancestor of itself resolves without looping, at the cost of leaving that
/// one occurrence as a reference.
struct Resolver<'a> {
    components: &'a Components,
    in_flight: HashSet<String>,
}

impl Document {
    /// Replace every reference reachable from the path table with its
    /// concrete definition from the component set.
    ///
    /// Idempotent; run exactly once after the merge, before serving.
    pub fn resolve_references(&mut self) -> Result<(), LoadError> {
        let mut paths = std::mem::take(&mut self.paths);
        let mut resolver = Resolver {
            components: &self.components,
            in_flight: HashSet::new(),
        };
        let result = resolver.resolve_paths(&mut paths);
        self.paths = paths;
        result
    }
}

impl Resolver<'_> {
    fn resolve_paths(&mut self, paths: &mut PathTable) -> Result<(), LoadError> {
        for item in paths.values_mut() {
            for verb in Verb::ALL {
                if let Some(op) = item.operation_mut(verb) {
                    for parameter in &mut op.parameters {
                        self.resolve_parameter(parameter)?;
                    }
                    for response in op.responses.values_mut() {
                        self.resolve_response(response)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_parameter(&mut self, parameter: &mut Parameter) -> Result<(), LoadError> {
        if let Parameter::Reference { reference } = parameter {
            let key = reference.0.clone();
            if !self.in_flight.insert(key.clone()) {
                return Ok(());
            }
            let found = self
                .components
                .parameters
                .get(reference.name())
                .cloned()
                .ok_or_else(|| LoadError::DanglingReference(key.clone()))?;
            *parameter = found;
            let nested = self.resolve_parameter(parameter);
            self.in_flight.remove(&key);
            return nested;
        }

        if let Parameter::Inline(obj) = parameter {
            if let Some(schema) = &mut obj.schema {
                self.resolve_schema(schema)?;
            }
        }
        Ok(())
    }

    fn resolve_response(&mut self, response: &mut Response) -> Result<(), LoadError> {
        if let Response::Reference { reference } = response {
            let key = reference.0.clone();
            if !self.in_flight.insert(key.clone()) {
                return Ok(());
            }
            let found = self
                .components
                .responses
                .get(reference.name())
                .cloned()
                .ok_or_else(|| LoadError::DanglingReference(key.clone()))?;
            *response = found;
            let nested = self.resolve_response(response);
            self.in_flight.remove(&key);
            return nested;
        }

        if let Response::Inline(obj) = response {
            for media in obj.content.values_mut() {
                if let Some(schema) = &mut media.schema {
                    self.resolve_schema(schema)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_schema(&mut self, schema: &mut Schema) -> Result<(), LoadError> {
        if let Schema::Reference { reference } = schema {
            let key = reference.0.clone();
            if !self.in_flight.insert(key.clone()) {
                return Ok(());
            }
            let found = self
                .components
                .schemas
                .get(reference.name())
                .cloned()
                .ok_or_else(|| LoadError::DanglingReference(key.clone()))?;
            *schema = found;
            let nested = self.resolve_schema(schema);
            self.in_flight.remove(&key);
            return nested;
        }

        if let Schema::Inline(obj) = schema {
            for nested in obj.properties.values_mut() {
                self.resolve_schema(nested)?;
            }
            if let Some(items) = &mut obj.items {
                self.resolve_schema(items)?;
            }
            if let Some(additional) = &mut obj.additional_properties {
                self.resolve_schema(additional)?;
            }
        }
        Ok(())
    }
}
