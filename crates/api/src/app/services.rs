//! Store wiring: one Context per backing store.

use heroes_core::{Hero, User, normalize_username};
use heroes_infra::crud::{InMemoryStore, MongoStore, PostgresStore};
use heroes_infra::{AppConfig, Context, Filter, Page, schemas};

/// Long-lived handles shared by every request. Read-only after bootstrap.
#[derive(Clone)]
pub struct AppServices {
    /// Heroes (document store).
    pub heroes: Context<Hero>,
    /// Credentials (relational store).
    pub users: Context<User>,
}

impl AppServices {
    pub fn new(heroes: Context<Hero>, users: Context<User>) -> Self {
        Self { heroes, users }
    }

    /// Both stores in memory (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Context::new(InMemoryStore::<Hero>::new()),
            Context::new(InMemoryStore::<User>::new()),
        )
    }
}

/// Connect both stores as configured and seed the bootstrap user.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let services = if config.use_persistent_stores {
        let client = MongoStore::<Hero>::connect(&config.mongo.url).await?;
        let heroes = MongoStore::<Hero>::new(&client, &config.mongo.database, schemas::HEROES_COLLECTION);

        let pool = PostgresStore::<User>::connect(&config.postgres).await?;
        let model = PostgresStore::<User>::define_model(&pool, schemas::USERS).await?;
        let users = PostgresStore::<User>::new(pool, model);

        AppServices::new(Context::new(heroes), Context::new(users))
    } else {
        tracing::warn!("running on in-memory stores; data is lost on exit");
        AppServices::in_memory()
    };

    if let Some(seed) = &config.seed_user {
        ensure_user(&services.users, &seed.username, &seed.password).await?;
    }

    Ok(services)
}

/// Create `username` with `password` unless a user with that name exists.
pub async fn ensure_user(users: &Context<User>, username: &str, password: &str) -> anyhow::Result<()> {
    let username = normalize_username(username);
    let existing = users
        .read(&Filter::all().eq("username", username.clone()), Page::new(0, 1))
        .await?;
    if !existing.is_empty() {
        return Ok(());
    }

    let verifier = heroes_auth::hash_password(password)?;
    let created = users.create(User::new(&username, verifier)).await?;
    tracing::info!(%username, id = %created.id, "seeded user");
    Ok(())
}
