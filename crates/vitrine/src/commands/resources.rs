//! Resource commands - catalog CRUD.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use vitrine_client::{Characteristic, CharacteristicsRequest, Page};

use super::{Context, Services, build_form, print_done, print_value};

/// Form-based collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormResource {
    Brands,
    Categories,
    Subcategories,
    Products,
}

impl FormResource {
    fn singular(self) -> &'static str {
        match self {
            FormResource::Brands => "brand",
            FormResource::Categories => "category",
            FormResource::Subcategories => "subcategory",
            FormResource::Products => "product",
        }
    }
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.page, args.limit)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Brands, categories, subcategories, products
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for form-based resource commands.
#[derive(Args, Debug)]
pub struct FormResourceArgs {
    #[command(subcommand)]
    pub command: FormCommand,
}

#[derive(Subcommand, Debug)]
pub enum FormCommand {
    /// List one page
    List(PageArgs),

    /// Create an item from form fields
    Create {
        /// Form field as key=value (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Form file as key=path (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Update an item
    Update {
        /// Item ID
        id: i64,

        /// Form field as key=value (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Form file as key=path (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: i64,
    },
}

pub async fn run_form(resource: FormResource, args: FormResourceArgs, ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    let result = form_command(&services, resource, args.command, ctx).await;
    services.report_navigation();
    result
}

async fn form_command(
    services: &Services,
    resource: FormResource,
    command: FormCommand,
    ctx: &Context,
) -> Result<()> {
    let client = &services.client;
    match command {
        FormCommand::List(page) => {
            let page = Page::from(page);
            let value = match resource {
                FormResource::Brands => client.brands().list(page).await?,
                FormResource::Categories => client.categories().list(page).await?,
                FormResource::Subcategories => client.subcategories().list(page).await?,
                FormResource::Products => client.products().list(page).await?,
            };
            print_value(&value, ctx)
        }
        FormCommand::Create { fields, files } => {
            let form = build_form(&fields, &files)?;
            let value = match resource {
                FormResource::Brands => client.brands().create(form).await?,
                FormResource::Categories => client.categories().create(form).await?,
                FormResource::Subcategories => client.subcategories().create(form).await?,
                FormResource::Products => client.products().create(form).await?,
            };
            report_saved(&value, "Created", resource.singular(), ctx)
        }
        FormCommand::Update { id, fields, files } => {
            let form = build_form(&fields, &files)?;
            let value = match resource {
                FormResource::Brands => client.brands().update(id, form).await?,
                FormResource::Categories => client.categories().update(id, form).await?,
                FormResource::Subcategories => client.subcategories().update(id, form).await?,
                FormResource::Products => client.products().update(id, form).await?,
            };
            report_saved(&value, "Updated", resource.singular(), ctx)
        }
        FormCommand::Delete { id } => {
            match resource {
                FormResource::Brands => client.brands().delete(id).await?,
                FormResource::Categories => client.categories().delete(id).await?,
                FormResource::Subcategories => client.subcategories().delete(id).await?,
                FormResource::Products => client.products().delete(id).await?,
            }
            print_done(format!("Deleted {} {}", resource.singular(), id), ctx);
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tags
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the tags command.
#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List one page of tags
    List(PageArgs),

    /// Create a tag
    Create { name: String, value: String },

    /// Replace a tag
    Update { id: i64, name: String, value: String },

    /// Delete a tag
    Delete { id: i64 },
}

pub async fn run_tags(args: TagArgs, ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    let result = tag_command(&services, args.command, ctx).await;
    services.report_navigation();
    result
}

async fn tag_command(services: &Services, command: TagCommand, ctx: &Context) -> Result<()> {
    let tags = services.client.tags();
    match command {
        TagCommand::List(page) => print_value(&tags.list(page.into()).await?, ctx),
        TagCommand::Create { name, value } => {
            report_saved(&tags.create(name, value).await?, "Created", "tag", ctx)
        }
        TagCommand::Update { id, name, value } => {
            report_saved(&tags.update(id, name, value).await?, "Updated", "tag", ctx)
        }
        TagCommand::Delete { id } => {
            tags.delete(id).await?;
            print_done(format!("Deleted tag {}", id), ctx);
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Characteristics
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the characteristics command.
#[derive(Args, Debug)]
pub struct CharacteristicArgs {
    #[command(subcommand)]
    pub command: CharacteristicCommand,
}

#[derive(Subcommand, Debug)]
pub enum CharacteristicCommand {
    /// List one page of characteristic groups
    List(PageArgs),

    /// Create a characteristic group
    Create {
        /// Group name
        name: String,

        /// Entry as name:label:value (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,
    },

    /// Replace a characteristic group
    Update {
        id: i64,

        /// Group name
        name: String,

        /// Entry as name:label:value (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,
    },

    /// Delete a characteristic group
    Delete { id: i64 },
}

pub async fn run_characteristics(args: CharacteristicArgs, ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    let result = characteristic_command(&services, args.command, ctx).await;
    services.report_navigation();
    result
}

async fn characteristic_command(
    services: &Services,
    command: CharacteristicCommand,
    ctx: &Context,
) -> Result<()> {
    let api = services.client.characteristics();
    match command {
        CharacteristicCommand::List(page) => print_value(&api.list(page.into()).await?, ctx),
        CharacteristicCommand::Create { name, items } => {
            let request = characteristics_request(name, &items)?;
            report_saved(&api.create(&request).await?, "Created", "characteristic group", ctx)
        }
        CharacteristicCommand::Update { id, name, items } => {
            let request = characteristics_request(name, &items)?;
            report_saved(
                &api.update(id, &request).await?,
                "Updated",
                "characteristic group",
                ctx,
            )
        }
        CharacteristicCommand::Delete { id } => {
            api.delete(id).await?;
            print_done(format!("Deleted characteristic group {}", id), ctx);
            Ok(())
        }
    }
}

fn characteristics_request(name: String, items: &[String]) -> Result<CharacteristicsRequest> {
    let characteristics = items
        .iter()
        .map(|raw| parse_characteristic(raw))
        .collect::<Result<Vec<_>>>()?;
    Ok(CharacteristicsRequest {
        name,
        characteristics,
    })
}

fn parse_characteristic(raw: &str) -> Result<Characteristic> {
    let mut parts = raw.splitn(3, ':');
    let (Some(name), Some(label), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("expected name:label:value, got '{}'", raw);
    };
    Ok(Characteristic {
        name: name.to_string(),
        label: label.to_string(),
        value: value.to_string(),
    })
}

fn report_saved(value: &Value, verb: &str, noun: &str, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_value(value, ctx);
    }
    match value.get("id") {
        Some(id) => print_done(format!("{} {} {}", verb, noun, id), ctx),
        None => print_done(format!("{} {}", verb, noun), ctx),
    }
    if ctx.verbose {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("formatting response")?
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_characteristic() {
        let c = parse_characteristic("eu:EU size:42").unwrap();
        assert_eq!(c.name, "eu");
        assert_eq!(c.label, "EU size");
        assert_eq!(c.value, "42");

        let with_colon = parse_characteristic("ratio:Ratio:16:9").unwrap();
        assert_eq!(with_colon.value, "16:9");

        assert!(parse_characteristic("eu:EU").is_err());
    }

    #[test]
    fn test_characteristics_request() {
        let request =
            characteristics_request("Size".to_string(), &["eu:EU:42".to_string()]).unwrap();
        assert_eq!(request.name, "Size");
        assert_eq!(request.characteristics.len(), 1);
    }
}
