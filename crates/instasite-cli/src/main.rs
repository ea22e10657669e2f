//! Instasite CLI, a command-line client for the Instasite customization server.
//!
//! A standalone HTTP client that communicates with the Instasite server.
//! No internal crate dependencies; it talks exclusively via the REST API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BANNER_SMALL: &str = "◆ Instasite";

// ── CLI structure ────────────────────────────────────────────────────

/// Instasite: pick a template, make it yours.
#[derive(Parser)]
#[command(
    name = "instasite",
    version,
    about = "Instasite CLI — browse templates and customize your website",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         INSTASITE_ADDR   Server address (default: http://127.0.0.1:8300)\n\n\
         {DIM}Examples:{RESET}\n  \
         instasite templates --category Food\n  \
         instasite select creative-portfolio\n  \
         instasite color secondary '#000000'\n  \
         instasite set-logo ./logo.png"
    ),
)]
struct Cli {
    /// Instasite server address.
    #[arg(long, env = "INSTASITE_ADDR", default_value = "http://127.0.0.1:8300")]
    addr: String,

    /// Print raw JSON responses.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server and store status.
    Status,
    /// List templates.
    Templates {
        /// Only show templates in this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// List template categories.
    Categories,
    /// Show one template.
    Template {
        /// Template id, e.g. `modern-business`.
        id: String,
    },
    /// Show the current customization.
    Show,
    /// Set the business name.
    SetName {
        /// New business name (may be empty).
        name: String,
    },
    /// Set the logo from an image file or a `data:` URI.
    SetLogo {
        /// Path to an image file, or a `data:` URI.
        source: String,
    },
    /// Remove the logo.
    ClearLogo,
    /// Select a template. Resets both colors to the template's palette.
    Select {
        /// Template id.
        id: String,
    },
    /// Set a color.
    Color {
        /// Color slot.
        #[arg(value_parser = ["primary", "secondary"])]
        slot: String,
        /// Color value, e.g. `#3B82F6`.
        value: String,
    },
    /// Set a font.
    Font {
        /// Font slot.
        #[arg(value_parser = ["heading", "body"])]
        slot: String,
        /// Font family name.
        value: String,
    },
    /// Show or hide a section.
    Toggle {
        /// Section name.
        #[arg(value_parser = ["hero", "features", "testimonials", "contact"])]
        section: String,
    },
    /// Restore the default customization.
    Reset,
    /// Wait until queued changes are saved.
    Flush,
    /// Show the mock preview.
    Preview {
        /// Device frame.
        #[arg(long, default_value = "desktop", value_parser = ["desktop", "tablet", "mobile"])]
        viewport: String,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("-")
}

fn print_status(resp: &Value) {
    header("◆", "Instasite Status");

    let ready = resp.get("status").and_then(Value::as_str) == Some("ready");
    let status = if ready {
        format!("{GREEN}ready{RESET}")
    } else {
        format!("{YELLOW}loading{RESET}")
    };
    kv_line("Store", &status);
    kv_line("Storage", str_field(resp, "/storage"));

    let revision = resp.get("revision").and_then(Value::as_u64).unwrap_or(0);
    let persisted = resp
        .get("persisted_revision")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    kv_line("Changes", &revision.to_string());
    kv_line("Saved", &persisted.to_string());
    println!();

    if revision > persisted {
        warning("some changes are not saved yet");
    }
}

fn print_template_line(template: &Value) {
    println!(
        "  {BOLD}{:<20}{RESET} {:<20} {DIM}{}{RESET}",
        str_field(template, "/id"),
        str_field(template, "/name"),
        str_field(template, "/category"),
    );
}

fn print_template(template: &Value) {
    header("▦", str_field(template, "/name"));
    kv_line("Id", str_field(template, "/id"));
    kv_line("Category", str_field(template, "/category"));
    kv_line("Preview", str_field(template, "/previewImage"));

    let features: Vec<&str> = template
        .get("features")
        .and_then(Value::as_array)
        .map(|f| f.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    kv_line("Features", &features.join(", "));

    for slot in ["primary", "secondary", "accent", "background", "text"] {
        kv_line(slot, str_field(template, &format!("/colors/{slot}")));
    }
    println!();
}

fn print_customization(state: &Value) {
    header("✎", "Customization");
    kv_line("Business name", str_field(state, "/businessName"));

    let logo = match state.get("logo").and_then(Value::as_str) {
        Some(logo) => describe_logo(logo),
        None => format!("{DIM}none{RESET}"),
    };
    kv_line("Logo", &logo);
    kv_line("Template", str_field(state, "/selectedTemplate"));
    kv_line("Primary color", str_field(state, "/customizations/colors/primary"));
    kv_line(
        "Secondary color",
        str_field(state, "/customizations/colors/secondary"),
    );
    kv_line("Heading font", str_field(state, "/customizations/fonts/heading"));
    kv_line("Body font", str_field(state, "/customizations/fonts/body"));

    for section in ["hero", "features", "testimonials", "contact"] {
        let shown = state
            .pointer(&format!("/customizations/sections/{section}"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let label = if shown {
            format!("{GREEN}shown{RESET}")
        } else {
            format!("{RED}hidden{RESET}")
        };
        kv_line(section, &label);
    }
    println!();
}

fn print_preview(preview: &Value) {
    header("▣", str_field(preview, "/title"));
    match preview.get("logo").and_then(Value::as_str) {
        Some(logo) => kv_line("Logo", &describe_logo(logo)),
        None => kv_line("Monogram", str_field(preview, "/monogram")),
    }
    kv_line("Template", str_field(preview, "/template/name"));

    let frame = preview
        .get("frame_width_px")
        .and_then(Value::as_u64)
        .map_or_else(|| "full width".to_owned(), |w| format!("{w}px"));
    kv_line(
        "Viewport",
        &format!("{} ({frame})", str_field(preview, "/viewport")),
    );

    for slot in ["primary", "secondary", "accent", "background", "text"] {
        kv_line(slot, str_field(preview, &format!("/palette/{slot}")));
    }
    kv_line(
        "Fonts",
        &format!(
            "{} / {}",
            str_field(preview, "/fonts/heading"),
            str_field(preview, "/fonts/body")
        ),
    );

    let sections: Vec<&str> = preview
        .get("sections")
        .and_then(Value::as_array)
        .map(|s| s.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    kv_line("Sections", &sections.join(", "));
    println!();
}

/// Short description of a logo reference without dumping the payload.
fn describe_logo(logo: &str) -> String {
    match logo.strip_prefix("data:").and_then(|rest| rest.split_once(';')) {
        Some((mime, _)) => format!("{mime}, {} bytes inline", logo.len()),
        None => logo.to_owned(),
    }
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
}

impl Client {
    fn new(addr: String) -> Self {
        let http = reqwest::Client::new();
        let addr = addr.trim_end_matches('/').to_owned();
        Self { http, addr }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn get_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn post_no_body(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .post(self.url(path))
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or(body);
        bail!("server returned {status}: {message}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = Client::new(cli.addr);

    match run(&client, cli.command, cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &Client, cmd: Commands, raw: bool) -> Result<()> {
    let out = Output { raw };
    match cmd {
        Commands::Status => cmd_status(client, out).await,
        Commands::Templates { category } => cmd_templates(client, category.as_deref(), out).await,
        Commands::Categories => cmd_categories(client, out).await,
        Commands::Template { id } => {
            let resp = client.get(&format!("/v1/templates/{id}")).await?;
            out.show(&resp, print_template);
            Ok(())
        }
        Commands::Show => {
            let resp = client.get("/v1/customization").await?;
            out.show(&resp, print_customization);
            Ok(())
        }
        Commands::SetName { name } => {
            let resp = client
                .put("/v1/customization/business-name", &json!({ "name": name }))
                .await?;
            out.updated(&resp, "business name updated");
            Ok(())
        }
        Commands::SetLogo { source } => cmd_set_logo(client, &source, out).await,
        Commands::ClearLogo => {
            let resp = client.delete("/v1/customization/logo").await?;
            out.updated(&resp, "logo removed");
            Ok(())
        }
        Commands::Select { id } => cmd_select(client, &id, out).await,
        Commands::Color { slot, value } => {
            let resp = client
                .put(
                    &format!("/v1/customization/colors/{slot}"),
                    &json!({ "value": value }),
                )
                .await?;
            out.updated(&resp, &format!("{slot} color set to {value}"));
            Ok(())
        }
        Commands::Font { slot, value } => {
            let resp = client
                .put(
                    &format!("/v1/customization/fonts/{slot}"),
                    &json!({ "value": value }),
                )
                .await?;
            out.updated(&resp, &format!("{slot} font set to {value}"));
            Ok(())
        }
        Commands::Toggle { section } => cmd_toggle(client, &section, out).await,
        Commands::Reset => {
            let resp = client.post_no_body("/v1/customization/reset").await?;
            out.updated(&resp, "customization reset to defaults");
            Ok(())
        }
        Commands::Flush => cmd_flush(client, out).await,
        Commands::Preview { viewport } => {
            let resp = client
                .get_query("/v1/preview", &[("viewport", viewport.as_str())])
                .await?;
            out.show(&resp, print_preview);
            Ok(())
        }
    }
}

/// Chooses between raw JSON and formatted output.
#[derive(Clone, Copy)]
struct Output {
    raw: bool,
}

impl Output {
    fn show(self, value: &Value, pretty: fn(&Value)) {
        if self.raw {
            print_json(value);
        } else {
            println!();
            pretty(value);
        }
    }

    fn updated(self, state: &Value, msg: &str) {
        if self.raw {
            print_json(state);
        } else {
            success(msg);
        }
    }
}

// ── Catalog commands ─────────────────────────────────────────────────

async fn cmd_templates(client: &Client, category: Option<&str>, out: Output) -> Result<()> {
    let resp = match category {
        Some(category) => {
            client
                .get_query("/v1/templates", &[("category", category)])
                .await?
        }
        None => client.get("/v1/templates").await?,
    };
    if out.raw {
        print_json(&resp);
        return Ok(());
    }

    let templates = resp
        .get("templates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    println!();
    header("▦", "Templates");
    if templates.is_empty() {
        warning("no templates in this category");
    }
    for template in &templates {
        print_template_line(template);
    }
    println!();
    Ok(())
}

async fn cmd_categories(client: &Client, out: Output) -> Result<()> {
    let resp = client.get("/v1/templates/categories").await?;
    if out.raw {
        print_json(&resp);
        return Ok(());
    }

    println!();
    header("▤", "Categories");
    for category in resp
        .get("categories")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        println!("  {category}");
    }
    println!();
    Ok(())
}

// ── Customization commands ───────────────────────────────────────────

async fn cmd_status(client: &Client, out: Output) -> Result<()> {
    if !out.raw {
        println!();
        println!("  {BANNER_SMALL} {DIM}checking health...{RESET}");
        println!();
    }
    let resp = client.get("/v1/sys/health").await?;
    if out.raw {
        print_json(&resp);
    } else {
        print_status(&resp);
    }
    Ok(())
}

async fn cmd_set_logo(client: &Client, source: &str, out: Output) -> Result<()> {
    let logo = logo_data_uri(source)?;
    let resp = client
        .put("/v1/customization/logo", &json!({ "logo": logo }))
        .await?;
    out.updated(&resp, &format!("logo set ({})", describe_logo(&logo)));
    Ok(())
}

async fn cmd_select(client: &Client, id: &str, out: Output) -> Result<()> {
    let resp = client
        .put("/v1/customization/template", &json!({ "template_id": id }))
        .await?;
    if out.raw {
        print_json(&resp);
        return Ok(());
    }

    let selected = str_field(&resp, "/selectedTemplate");
    if selected != id {
        warning(&format!("unknown template '{id}', selected '{selected}' instead"));
    }
    success(&format!(
        "template '{selected}' selected, colors reset to {} / {}",
        str_field(&resp, "/customizations/colors/primary"),
        str_field(&resp, "/customizations/colors/secondary"),
    ));
    Ok(())
}

async fn cmd_toggle(client: &Client, section: &str, out: Output) -> Result<()> {
    let resp = client
        .post_no_body(&format!("/v1/customization/sections/{section}/toggle"))
        .await?;
    let shown = resp
        .pointer(&format!("/customizations/sections/{section}"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let state = if shown { "shown" } else { "hidden" };
    out.updated(&resp, &format!("{section} section {state}"));
    Ok(())
}

async fn cmd_flush(client: &Client, out: Output) -> Result<()> {
    let resp = client.post_no_body("/v1/customization/flush").await?;
    if out.raw {
        print_json(&resp);
        return Ok(());
    }

    if resp.get("persisted").and_then(Value::as_bool).unwrap_or(false) {
        success("all changes saved");
    } else {
        warning("latest changes could not be saved, they remain in the server's memory");
    }
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Turn a file path into a base64 `data:` URI. `data:` URIs pass through.
fn logo_data_uri(source: &str) -> Result<String> {
    if source.starts_with("data:") {
        return Ok(source.to_owned());
    }

    let path = Path::new(source);
    let mime = mime_guess::from_path(path)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .with_context(|| format!("unsupported logo file type: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("logo file is empty: {}", path.display());
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_passes_through() {
        let uri = "data:image/png;base64,AA==";
        assert_eq!(logo_data_uri(uri).unwrap(), uri);
    }

    #[test]
    fn file_is_encoded_with_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Logo.SVG");
        std::fs::write(&path, b"<svg/>").unwrap();

        let uri = logo_data_uri(path.to_str().unwrap()).unwrap();
        assert_eq!(uri, "data:image/svg+xml;base64,PHN2Zy8+");
    }

    #[test]
    fn unsupported_or_empty_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("logo.txt");
        std::fs::write(&text, b"hello").unwrap();
        assert!(logo_data_uri(text.to_str().unwrap()).is_err());

        let archive = dir.path().join("logo.zip");
        std::fs::write(&archive, b"PK").unwrap();
        assert!(logo_data_uri(archive.to_str().unwrap()).is_err());

        let empty = dir.path().join("logo.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(logo_data_uri(empty.to_str().unwrap()).is_err());
    }

    #[test]
    fn any_image_extension_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        for (name, mime) in [
            ("logo.bmp", "image/bmp"),
            ("logo.avif", "image/avif"),
            ("logo.tiff", "image/tiff"),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"img").unwrap();
            let uri = logo_data_uri(path.to_str().unwrap()).unwrap();
            assert_eq!(uri, format!("data:{mime};base64,aW1n"));
        }
    }

    #[test]
    fn logo_description_hides_payload() {
        assert_eq!(
            describe_logo("data:image/png;base64,AAAA"),
            "image/png, 26 bytes inline"
        );
        assert_eq!(describe_logo("/img/logo.png"), "/img/logo.png");
    }
}
