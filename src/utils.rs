use axum::extract::FromRequest;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Cursor,
};
use serde::de::DeserializeOwned;

use crate::{
    action::Resource,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// JSON body whose rejections are reported as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Primary keys arrive as path strings; anything that is not an integer
/// cannot name a stored object.
pub fn parse_pk(raw: &str) -> ApiResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| ApiError::NotFound)
}

/// Allocates the next integer id for a collection.
pub async fn next_id(state: &AppState, resource: Resource) -> ApiResult<i64> {
    let counters = state.db.collection::<Document>("counters");
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let counter = counters
        .find_one_and_update(
            doc! { "_id": resource.collection() },
            doc! { "$inc": { "seq": 1_i64 } },
            options,
        )
        .await?;

    counter
        .and_then(|counter| counter.get_i64("seq").ok())
        .ok_or_else(|| ApiError::Internal(format!("no id counter for {}", resource.collection())))
}

pub fn sorted_by_id() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

pub async fn list_all<T>(state: &AppState, resource: Resource) -> ApiResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = state.collection::<T>(resource).find(None, sorted_by_id()).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn find_by_id<T>(state: &AppState, resource: Resource, id: i64) -> ApiResult<T>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    state
        .collection::<T>(resource)
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Stores validated fields under a freshly allocated id.
pub async fn insert_fields<T: DeserializeOwned>(
    state: &AppState,
    resource: Resource,
    mut fields: Document,
) -> ApiResult<T> {
    let id = next_id(state, resource).await?;
    fields.insert("_id", id);
    state.documents(resource).insert_one(&fields, None).await?;
    tracing::info!(collection = resource.collection(), id, "created");
    Ok(from_document(fields)?)
}

/// Applies validated fields and returns the stored object afterwards.
pub async fn update_fields<T>(
    state: &AppState,
    resource: Resource,
    filter: Document,
    fields: Document,
) -> ApiResult<T>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let collection = state.collection::<T>(resource);
    let updated = if fields.is_empty() {
        collection.find_one(filter, None).await?
    } else {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        collection
            .find_one_and_update(filter, doc! { "$set": fields }, options)
            .await?
    };
    updated.ok_or(ApiError::NotFound)
}

/// Deletes one object, failing with not-found when nothing matched.
pub async fn delete_one(state: &AppState, resource: Resource, filter: Document) -> ApiResult<()> {
    let result = state.documents(resource).delete_one(filter, None).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::info!(collection = resource.collection(), "deleted");
    Ok(())
}

pub async fn collect_as<T: DeserializeOwned>(mut cursor: Cursor<Document>) -> ApiResult<Vec<T>> {
    let mut result = Vec::new();
    while let Some(doc) = cursor.try_next().await? {
        result.push(from_document(doc)?);
    }
    Ok(result)
}

/// Runs a pipeline expected to produce at most one document.
pub async fn aggregate_one<T: DeserializeOwned>(
    state: &AppState,
    resource: Resource,
    pipeline: Vec<Document>,
) -> ApiResult<T> {
    let mut cursor = state.documents(resource).aggregate(pipeline, None).await?;
    match cursor.try_next().await? {
        Some(doc) => Ok(from_document(doc)?),
        None => Err(ApiError::NotFound),
    }
}

pub async fn aggregate_all<T: DeserializeOwned>(
    state: &AppState,
    resource: Resource,
    pipeline: Vec<Document>,
) -> ApiResult<Vec<T>> {
    let cursor = state.documents(resource).aggregate(pipeline, None).await?;
    collect_as(cursor).await
}

/// Ids from `ids` that have no document in the collection.
pub async fn missing_ids(state: &AppState, resource: Resource, ids: &[i64]) -> ApiResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: Vec<i64> = state
        .documents(resource)
        .distinct("_id", doc! { "_id": { "$in": ids.to_vec() } }, None)
        .await?
        .into_iter()
        .filter_map(|id| id.as_i64())
        .collect();

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

pub fn invalid_pk_message(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pk_accepts_integers() {
        assert_eq!(parse_pk("42").unwrap(), 42);
        assert_eq!(parse_pk(" 7 ").unwrap(), 7);
    }

    #[test]
    fn parse_pk_rejects_garbage_as_not_found() {
        assert!(matches!(parse_pk("abc"), Err(ApiError::NotFound)));
        assert!(matches!(parse_pk(""), Err(ApiError::NotFound)));
        assert!(matches!(parse_pk("1.5"), Err(ApiError::NotFound)));
    }

    #[test]
    fn invalid_pk_message_names_the_id() {
        assert_eq!(invalid_pk_message(9), "Invalid pk \"9\" - object does not exist.");
    }
}
