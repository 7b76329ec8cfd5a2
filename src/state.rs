use anyhow::Context;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};

use crate::{action::Resource, config::AppConfig};

/// Shared by every handler through an `Extension<Arc<AppState>>` layer.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let client_options = ClientOptions::parse(&config.mongodb_uri)
            .await
            .context("failed to parse MongoDB connection string")?;
        let client = Client::with_options(client_options).context("failed to initialize MongoDB client")?;
        let db = client.database(&config.database_name);

        db.run_command(doc! { "ping": 1 }, None)
            .await
            .context("failed to ping MongoDB")?;
        tracing::info!(database = %config.database_name, "connected to MongoDB");

        ensure_indexes(&db).await.context("failed to create indexes")?;

        Ok(Self::new(db))
    }

    pub fn collection<T>(&self, resource: Resource) -> Collection<T> {
        self.db.collection::<T>(resource.collection())
    }

    pub fn documents(&self, resource: Resource) -> Collection<Document> {
        self.collection::<Document>(resource)
    }
}

/// Indexes backing the uniqueness rules: one ticket per seat and session,
/// unique usernames and tokens.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<Document>(Resource::Ticket.collection())
        .create_index(
            IndexModel::builder()
                .keys(doc! { "movie_session": 1, "row": 1, "seat": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    db.collection::<Document>(Resource::Ticket.collection())
        .create_index(IndexModel::builder().keys(doc! { "order": 1 }).build(), None)
        .await?;

    let users = db.collection::<Document>(Resource::User.collection());
    for key in ["username", "token"] {
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { key: 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
    }

    db.collection::<Document>(Resource::Order.collection())
        .create_index(IndexModel::builder().keys(doc! { "user": 1 }).build(), None)
        .await?;

    Ok(())
}
