use anyhow::Result;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod filters;
mod models;
mod services;
mod view;

use config::Command;
use filters::{FilterField, FilterForm};
use services::file_service::{FileService, UploadOutcome};
use view::file_list::FileListView;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + command ---
    let (cfg, command) = config::AppConfig::from_env_and_args();
    tracing::debug!("Starting file-store-cli with config: {:?}", cfg);

    let service = FileService::new(&cfg.api_base_url);

    match command {
        Command::List {
            search,
            file_type,
            min_size,
            max_size,
            start_date,
            end_date,
            is_reference,
            min_reference_count,
            max_reference_count,
            page,
        } => {
            let mut form = FilterForm::new();
            let fields = [
                (FilterField::Search, search),
                (FilterField::FileType, file_type),
                (FilterField::MinSize, min_size),
                (FilterField::MaxSize, max_size),
                (FilterField::StartDate, start_date),
                (FilterField::EndDate, end_date),
                (FilterField::IsReference, is_reference),
                (FilterField::MinReferenceCount, min_reference_count),
                (FilterField::MaxReferenceCount, max_reference_count),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    form.update_field(field, value);
                }
            }
            run_list(&service, form, page).await
        }
        Command::Upload { path } => run_upload(&service, &path).await,
        Command::Download { id, output } => {
            run_download(&service, &cfg.download_dir, &id, output).await
        }
        Command::Delete { id } => run_delete(&service, &id).await,
    }
}

/// Apply the filter form, load the collection, and print the rendered view.
async fn run_list(service: &FileService, mut form: FilterForm, page: u32) -> Result<()> {
    let filter = form.apply();
    if form.has_active_filters() {
        tracing::info!("Listing files with active filters");
    }

    let mut list = FileListView::new();
    list.apply_filter(filter);
    list.set_page(page);

    let token = list.begin_load();
    let result = service.list_files(list.filter(), list.page()).await;
    list.finish_load(token, result);

    println!("{}", list.render());
    Ok(())
}

async fn run_upload(service: &FileService, path: &Path) -> Result<()> {
    let outcome = service.upload_file(path).await?;
    match outcome {
        UploadOutcome::Created(record) => {
            tracing::info!("Uploaded new file {}", record.id);
            println!(
                "Uploaded {} ({}, {} bytes)",
                record.original_filename, record.id, record.size
            );
        }
        UploadOutcome::ReferencedExisting { id, record } => {
            tracing::info!("Upload deduplicated into reference {}", id);
            println!("File content already stored; reference created ({id})");
            if let Some(record) = record {
                println!(
                    "Original: {} (referenced {} times)",
                    record.original_filename,
                    record.reference_count.saturating_sub(1)
                );
            }
        }
    }
    Ok(())
}

async fn run_download(
    service: &FileService,
    download_dir: &str,
    id: &str,
    output: Option<String>,
) -> Result<()> {
    let record = service.get_file(id).await?;
    let filename = output.unwrap_or_else(|| record.original_filename.clone());

    match service
        .download_file(&record.file, Path::new(download_dir), &filename)
        .await
    {
        Ok(dest) => {
            println!("Saved {} to {}", record.original_filename, dest.display());
            Ok(())
        }
        Err(err) => {
            // Download failures are operator-log material, never a page error.
            tracing::error!("Download error: {err}");
            anyhow::bail!("{err}")
        }
    }
}

async fn run_delete(service: &FileService, id: &str) -> Result<()> {
    service.delete_file(id).await?;
    println!("Deleted {id}");
    Ok(())
}
