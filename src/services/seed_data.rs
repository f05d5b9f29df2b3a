use crate::models::NewTodo;
use crate::services::todo_store::TodoStore;

const DEMO_AUTHOR: &str = "Admin";

const DEMO_TODOS: [(&str, &str); 6] = [
    ("Running", "Get Going"),
    ("Learning", "Learn something new"),
    ("Walking", "Get Going"),
    ("Eating", "Learn something new"),
    ("Drinking", "Get Going"),
    ("Diving", "Learn something new"),
];

pub async fn seed_demo_todos(store: &dyn TodoStore) -> anyhow::Result<()> {
    // Check if data already exists
    if !store.find_all().await?.is_empty() {
        tracing::info!("Todo store already has data, skipping seed");
        return Ok(());
    }

    tracing::info!("Seeding {} demo todos...", DEMO_TODOS.len());
    for (title, body) in DEMO_TODOS {
        store.create(NewTodo::new(title, body, DEMO_AUTHOR)).await?;
    }

    Ok(())
}
