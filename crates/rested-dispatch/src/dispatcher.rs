use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rested_gate::RightsPolicy;
use rested_store::ResourceCollection;
use rested_types::{Payload, Resource, ResourceId};
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::OperationContext;
use crate::outcome::{ErrorDetail, Outcome};
use crate::query::ListQuery;
use crate::request::Request;

/// Generic CRUD over one collection, gated by a rights policy.
///
/// Every handler returns an [`Outcome`]; nothing here knows about the
/// transport. `C` is the caller context handed to rights predicates.
pub struct Dispatcher<R: Resource, C> {
    collection: Arc<ResourceCollection<R>>,
    rights: RightsPolicy<R, C>,
}

impl<R: Resource, C> Dispatcher<R, C> {
    pub fn new(collection: Arc<ResourceCollection<R>>, rights: RightsPolicy<R, C>) -> Self {
        Self { collection, rights }
    }

    pub fn collection(&self) -> &Arc<ResourceCollection<R>> {
        &self.collection
    }

    pub fn rights(&self) -> &RightsPolicy<R, C> {
        &self.rights
    }

    /// Route a verb invocation to its handler.
    pub async fn dispatch(&self, ctx: &OperationContext<C>, request: Request) -> Outcome {
        match request {
            Request::GetOne { id } => self.get_one(ctx, &id),
            Request::GetAll { query } => self.get_all(ctx, &query),
            Request::Post { payload } => self.post(ctx, &payload).await,
            Request::PutOne { id, payload } => self.put_one(ctx, &id, &payload).await,
            Request::PutAll { payload } => self.put_all(ctx, &payload).await,
            Request::PatchOne { id, payload } => self.patch_one(ctx, &id, &payload).await,
            Request::DeleteOne { id } => self.delete_one(ctx, &id).await,
            Request::DeleteAll => self.delete_all(ctx).await,
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub fn get_one(&self, ctx: &OperationContext<C>, id: &ResourceId) -> Outcome {
        let Some(resource) = self.collection.get(id.as_str()) else {
            return Outcome::NotFound;
        };
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        if !self.rights.may_read(&ctx.caller, &resource) {
            return self.disallow(ctx, &resource);
        }
        if !self.collection.is_modified_since(ctx.if_modified_since) {
            return Outcome::NotModified;
        }

        match serde_json::to_value(resource.as_ref()) {
            Ok(body) => Outcome::Ok { body },
            Err(e) => Outcome::internal(ErrorDetail::new(e.to_string())),
        }
    }

    /// Every readable resource passing the query's filter, ordered and
    /// paged, as an id-keyed JSON object in listing order.
    pub fn get_all(&self, ctx: &OperationContext<C>, query: &ListQuery) -> Outcome {
        let entries = self.collection.entries();
        let plan = match query.plan(&*entries) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(error = %e, "list query rejected");
                return e.into();
            }
        };

        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        if !self.collection.is_modified_since(ctx.if_modified_since) {
            return Outcome::NotModified;
        }

        let filtering = query.has_filter();
        let selected = plan.select(plan.order(&*entries), |resource| {
            self.rights.may_read(&ctx.caller, resource)
                && (!filtering || (R::KIND.filterable && resource.matches(&query.filter)))
        });

        let mut body = Map::with_capacity(selected.len());
        for (id, resource) in selected {
            match serde_json::to_value(resource.as_ref()) {
                Ok(value) => {
                    body.insert(id.to_string(), value);
                }
                Err(e) => return Outcome::internal(ErrorDetail::new(e.to_string())),
            }
        }
        debug!(count = body.len(), "listed resources");
        Outcome::Ok {
            body: Value::Object(body),
        }
    }

    // -----------------------------------------------------------------
    // Creation and replacement
    // -----------------------------------------------------------------

    /// Create a resource that generates its own id.
    pub async fn post(&self, ctx: &OperationContext<C>, payload: &Payload) -> Outcome {
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }

        let mut resource = match R::from_payload(None, payload) {
            Ok(resource) => resource,
            Err(e) => return Outcome::bad_request(e),
        };
        if resource.id().is_some() {
            return Outcome::Conflict;
        }
        if !R::KIND.identity.generates_ids() {
            // Ids must come from the client through put.
            return Outcome::MethodNotAllowed {
                allowed: self.rights.allowed_methods(&ctx.caller, &resource),
            };
        }
        if !self.rights.may_create(&ctx.caller, &resource) {
            return self.disallow(ctx, &resource);
        }

        let Some(id) = resource.create_id() else {
            return Outcome::internal(ErrorDetail::new("resource did not generate an id"));
        };
        if self.collection.has(id.as_str()) {
            return Outcome::internal(ErrorDetail::new(format!(
                "generated id {id} already exists"
            )));
        }

        let location = id.clone();
        self.store(id, resource, Outcome::Created { location }).await
    }

    /// Create at a caller-chosen id, or replace the resource already there.
    pub async fn put_one(
        &self,
        ctx: &OperationContext<C>,
        id: &ResourceId,
        payload: &Payload,
    ) -> Outcome {
        match self.collection.get(id.as_str()) {
            None => self.create_at(ctx, id, payload).await,
            Some(current) => self.replace(ctx, id, &current, payload).await,
        }
    }

    async fn create_at(
        &self,
        ctx: &OperationContext<C>,
        id: &ResourceId,
        payload: &Payload,
    ) -> Outcome {
        if !ctx.is_json() {
            return Outcome::NotFound;
        }

        let resource = match R::from_payload(Some(id.clone()), payload) {
            Ok(resource) => resource,
            Err(e) => return Outcome::bad_request(e),
        };
        if !R::KIND.identity.accepts_client_ids()
            || !self.rights.may_create(&ctx.caller, &resource)
        {
            return self.disallow(ctx, &resource);
        }

        self.store(
            id.clone(),
            resource,
            Outcome::Created {
                location: id.clone(),
            },
        )
        .await
    }

    async fn replace(
        &self,
        ctx: &OperationContext<C>,
        id: &ResourceId,
        current: &R,
        payload: &Payload,
    ) -> Outcome {
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        if !self.rights.may_update(&ctx.caller, current) || !R::KIND.is_mutable() {
            return self.disallow(ctx, current);
        }

        let mut next = current.clone();
        if let Err(e) = next.edit(payload) {
            return Outcome::bad_request(e);
        }
        self.store(id.clone(), next, Outcome::NoContent).await
    }

    /// Make the collection equal to `payload`, an object of id → data.
    ///
    /// Unknown ids are created, known ids are edited and omitted ids are
    /// deleted. Every change is checked before anything is persisted.
    pub async fn put_all(&self, ctx: &OperationContext<C>, payload: &Payload) -> Outcome {
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        let Some(object) = payload.as_object() else {
            return Outcome::bad_request(ErrorDetail::new(
                "expected an object mapping ids to resources",
            ));
        };

        let current = self.collection.entries();
        let mut removed: BTreeMap<&ResourceId, &Arc<R>> = current.iter().collect();
        let mut next = Vec::with_capacity(object.len());

        for (raw_id, data) in object {
            let id = match ResourceId::parse(raw_id.as_str()) {
                Ok(id) => id,
                Err(e) => return Outcome::bad_request(ErrorDetail::new(e.to_string())),
            };

            let resource = match current.get(id.as_str()) {
                Some(existing) => {
                    if !self.rights.may_update(&ctx.caller, existing) || !R::KIND.is_mutable() {
                        return self.disallow(ctx, existing);
                    }
                    let mut edited = R::clone(existing);
                    if let Err(e) = edited.edit(data) {
                        return Outcome::bad_request(e);
                    }
                    removed.remove(&id);
                    edited
                }
                None => {
                    let created = match R::from_payload(Some(id.clone()), data) {
                        Ok(resource) => resource,
                        Err(e) => return Outcome::bad_request(e),
                    };
                    if !R::KIND.identity.accepts_client_ids()
                        || !self.rights.may_create(&ctx.caller, &created)
                    {
                        return self.disallow(ctx, &created);
                    }
                    created
                }
            };
            next.push((id, resource));
        }

        for existing in removed.values() {
            if !self.rights.may_delete(&ctx.caller, existing) {
                return self.disallow(ctx, existing);
            }
        }

        debug!(
            kept = next.len(),
            deleted = removed.len(),
            "replacing collection"
        );
        match self.collection.put_all(next).await {
            Ok(()) => Outcome::NoContent,
            Err(e) => Outcome::internal(&e),
        }
    }

    pub async fn patch_one(
        &self,
        ctx: &OperationContext<C>,
        id: &ResourceId,
        patch: &Payload,
    ) -> Outcome {
        let Some(current) = self.collection.get(id.as_str()) else {
            return Outcome::NotFound;
        };
        if !self.rights.may_update(&ctx.caller, &current) {
            return self.disallow(ctx, &current);
        }
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        if !R::KIND.is_mutable() {
            return self.disallow(ctx, &current);
        }

        let mut next = R::clone(&current);
        if let Err(e) = next.edit(patch) {
            return Outcome::bad_request(e);
        }
        self.store(id.clone(), next, Outcome::NoContent).await
    }

    // -----------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------

    pub async fn delete_one(&self, ctx: &OperationContext<C>, id: &ResourceId) -> Outcome {
        let Some(current) = self.collection.get(id.as_str()) else {
            return Outcome::NotFound;
        };
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        if !self.rights.may_delete(&ctx.caller, &current) {
            return self.disallow(ctx, &current);
        }

        match self.collection.delete(id).await {
            Ok(()) => {
                debug!(%id, "deleted");
                Outcome::NoContent
            }
            Err(e) => Outcome::internal(&e),
        }
    }

    /// Delete everything, provided the caller may delete every resource.
    pub async fn delete_all(&self, ctx: &OperationContext<C>) -> Outcome {
        if !ctx.is_json() {
            return Outcome::UnsupportedMediaType;
        }
        for resource in self.collection.list() {
            if !self.rights.may_delete(&ctx.caller, &resource) {
                return self.disallow(ctx, &resource);
            }
        }

        match self.collection.delete_all().await {
            Ok(()) => Outcome::NoContent,
            Err(e) => Outcome::internal(&e),
        }
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Answer a denied operation: 405 with the methods the caller could use,
    /// or 404 when there are none.
    pub fn disallow(&self, ctx: &OperationContext<C>, resource: &R) -> Outcome {
        let allowed = self.rights.allowed_methods(&ctx.caller, resource);
        if allowed.is_empty() {
            debug!(id = ?resource.id(), "operation denied, resource hidden");
            Outcome::NotFound
        } else {
            debug!(id = ?resource.id(), allowed = %allowed, "operation denied");
            Outcome::MethodNotAllowed { allowed }
        }
    }

    async fn store(&self, id: ResourceId, resource: R, success: Outcome) -> Outcome {
        match self.collection.put(id, resource).await {
            Ok(()) => success,
            Err(e) => Outcome::internal(&e),
        }
    }
}

impl<R: Resource, C> fmt::Debug for Dispatcher<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("collection", &self.collection)
            .field("rights", &self.rights)
            .finish()
    }
}
