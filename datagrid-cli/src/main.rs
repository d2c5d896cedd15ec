mod paths;

use std::fs;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use datagrid_lib::DataGrid;
use datagrid_lib::Error;
use datagrid_lib::GridConfig;
use datagrid_lib::backend::InMemoryBackend;
use datagrid_lib::model::ColumnDefinition;
use datagrid_lib::model::ColumnKind;
use datagrid_lib::model::GridSchema;
use datagrid_lib::model::Row;
use datagrid_lib::model::SaveEvent;
use datagrid_lib::model::User;
use datagrid_lib::notify::ToastQueue;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

const PLASMIDS: [&str; 4] = ["pUC19", "pET-28a", "pBR322", "pGEX-4T"];

fn init_logging() {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else {
        eprintln!("No cache directory; logging disabled");
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(LevelFilter::Debug, Config::default(), file) {
                eprintln!("Failed to initialize logger: {}", e);
            }
        }
        Err(e) => eprintln!("Failed to create {}: {}", path.display(), e),
    }
}

fn schema() -> GridSchema {
    GridSchema::new("id")
        .column(
            ColumnDefinition::new("id", "ID", ColumnKind::Link { base_url: "/plasmids/".into() })
                .edit_disabled(),
        )
        .column(
            ColumnDefinition::new("plasmid", "Plasmid", ColumnKind::Tag)
                .db_field("plasmid_name")
                .save_event(SaveEvent::Change)
                .option("choices", serde_json::json!(PLASMIDS)),
        )
        .column(ColumnDefinition::new("label", "Label", ColumnKind::Text))
        .column(ColumnDefinition::new(
            "concentration",
            "Concentration",
            ColumnKind::Number { unit: Some("ng/µL".into()) },
        ))
        .column(
            ColumnDefinition::new("owner", "Owner", ColumnKind::User { multiple: true })
                .db_field("owner_json"),
        )
}

fn users() -> Vec<User> {
    vec![
        User::new("u1", "Rosalind Franklin", "rosalind@lab.org"),
        User::new("u2", "Kary Mullis", "kary@lab.org"),
        User::new("u3", "Esther Lederberg", "esther@lab.org"),
    ]
}

fn seed_rows(count: i64, users: &[User]) -> Vec<Row> {
    (1..=count)
        .map(|id| {
            let index = id as usize;
            Row::new()
                .set("id", id)
                .set("plasmid", PLASMIDS[index % PLASMIDS.len()])
                .set("label", format!("Prep {:03}", id))
                .set("concentration", 40 + (id * 37) % 260)
                .set("owner", users[index % users.len()].clone())
        })
        .collect()
}

fn load_config(path: Option<PathBuf>) -> Result<GridConfig, Error> {
    match path {
        Some(path) if path.exists() => {
            log::info!("Loading config from {}", path.display());
            Ok(GridConfig::load(&path)?)
        }
        _ => Ok(GridConfig::default().with_server_side_pagination(true)),
    }
}

fn print_page(grid: &DataGrid, title: &str, toasts: &ToastQueue) {
    let info = grid.page_info();
    println!();
    println!(
        "== {} (page {}/{}, {} rows)",
        title, info.current_page, info.total_pages, info.total_count
    );
    if let Some(cache) = grid.cache_status() {
        println!(
            "   cache {:?} of {}, prev {}/{}, next {}/{}",
            cache.pages,
            cache.capacity,
            cache.previous_cached,
            cache.previous_possible,
            cache.next_cached,
            cache.next_possible
        );
    }

    let unique_key = grid.schema().unique_key.clone();
    for row in grid.visible_rows() {
        let Some(id) = row.id(&unique_key) else { continue };
        let cells: Vec<String> = grid
            .schema()
            .columns
            .iter()
            .map(|column| {
                grid.render_cell(&id, &column.key)
                    .map(|rendered| rendered.to_plain())
                    .unwrap_or_default()
            })
            .collect();
        println!("   {}", cells.join(" | "));
    }

    for toast in toasts.drain() {
        match toast.description {
            Some(description) => println!("   [{:?}] {}: {}", toast.level, toast.title, description),
            None => println!("   [{:?}] {}", toast.level, toast.title),
        }
    }
}

async fn run() -> Result<(), Error> {
    let config_path = std::env::args().nth(1).map(PathBuf::from).or_else(paths::config_file);
    let config = load_config(config_path)?;

    let schema = schema();
    let users = users();
    let backend = InMemoryBackend::new(Arc::new(schema.clone())).with_users(users.clone());
    backend.seed(seed_rows(57, &users));
    let backend = Arc::new(backend);

    let toasts = Arc::new(ToastQueue::new());
    let grid = DataGrid::builder(schema)
        .config(config)
        .backend(backend)
        .notifier(toasts.clone())
        .build()?;

    grid.load().await?;
    print_page(&grid, "Loaded", &toasts);

    grid.next_page().await?;
    grid.settle().await;
    print_page(&grid, "Next page", &toasts);

    grid.go_to_page(5).await?;
    grid.settle().await;
    print_page(&grid, "Jump to page 5", &toasts);

    grid.set_search_term("pBR").await?;
    print_page(&grid, "Search 'pBR'", &toasts);

    grid.set_search_term("").await?;
    grid.toggle_sort("label").await?;
    grid.toggle_sort("label").await?;
    print_page(&grid, "Sorted by label, descending", &toasts);

    let first = grid.visible_rows().first().and_then(|row| row.id("id"));
    if let Some(id) = first {
        grid.cell_click(&id, "plasmid").await?;
        grid.cell_change(&id, "plasmid", "pGEX-4T").await?;
        print_page(&grid, &format!("Plasmid of row {} changed", id), &toasts);

        grid.delete_row(&id).await?;
        grid.settle().await;
        print_page(&grid, &format!("Row {} deleted", id), &toasts);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
    }
}
