//! Recipe render model.

use cookbook_sdk::cookbook_content::{as_link, Asset, ContentError, Entry};
use cookbook_sdk::cookbook_core::{RouteConfig, RouteParams};
use cookbook_sdk::cookbook_richtext::Document;
use serde::Serialize;

/// Content type id of recipe entries.
pub const RECIPE_CONTENT_TYPE: &str = "recipe";

/// Route pattern of recipe pages.
pub const RECIPE_ROUTE: &str = "/recipes/:slug";

/// Featured image of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    /// Asset URL as stored, usually protocol-relative.
    pub url: String,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    pub title: Option<String>,
}

impl ImageAsset {
    fn from_field(entry: &Entry, field: &str) -> Result<Self, ContentError> {
        let value = entry
            .field(field)
            .ok_or_else(|| ContentError::malformed(entry.id(), field, "is missing"))?;

        if let Some(link) = as_link(value) {
            return Err(ContentError::malformed(
                entry.id(),
                field,
                format!("links to asset '{}' which was not included", link.id),
            ));
        }

        let asset: Asset = serde_json::from_value(value.clone())
            .map_err(|e| ContentError::malformed(entry.id(), field, e.to_string()))?;
        let file = asset
            .fields
            .file
            .as_ref()
            .ok_or_else(|| ContentError::malformed(entry.id(), field, "has no file.url"))?;
        let dimensions = asset.dimensions().ok_or_else(|| {
            ContentError::malformed(entry.id(), field, "has no file.details.image dimensions")
        })?;

        Ok(Self {
            url: file.url.clone(),
            width: dimensions.width,
            height: dimensions.height,
            title: asset.fields.title.clone(),
        })
    }
}

/// Everything the recipe page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRenderModel {
    pub slug: String,
    pub title: String,
    /// Cooking time in minutes.
    pub cooking_time: u32,
    pub featured_image: ImageAsset,
    /// Ingredients in display order.
    pub ingredients: Vec<String>,
    pub method: Document,
}

impl RecipeRenderModel {
    /// Build the model from a recipe entry whose links are resolved.
    ///
    /// `title`, `cookingTime` and a featured image with a URL and
    /// dimensions are required. Missing `ingredients` become an empty list
    /// and a missing `method` an empty document.
    pub fn from_entry(entry: &Entry) -> Result<Self, ContentError> {
        let slug: String = entry.required_field("slug")?;
        let title: String = entry.required_field("title")?;
        let cooking_time: u32 = entry.required_field("cookingTime")?;
        let featured_image = ImageAsset::from_field(entry, "featuredImage")?;
        let ingredients: Vec<String> = entry.field_as("ingredients")?.unwrap_or_default();

        let method = match entry.field("method") {
            None | Some(serde_json::Value::Null) => Document::empty(),
            Some(value) => Document::from_value(value)
                .map_err(|e| ContentError::malformed(entry.id(), "method", e.to_string()))?,
        };

        Ok(Self {
            slug,
            title,
            cooking_time,
            featured_image,
            ingredients,
            method,
        })
    }
}

/// Route parameters of one pre-buildable recipe page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathDescriptor {
    pub slug: String,
}

impl PathDescriptor {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }

    /// Route parameters (`slug`).
    pub fn params(&self) -> RouteParams {
        RouteParams::from([("slug".to_string(), self.slug.clone())])
    }

    /// Request path of the page.
    pub fn path(&self) -> String {
        RouteConfig::new(RECIPE_ROUTE, "recipe")
            .build_path(&self.params())
            .unwrap_or_else(|| format!("/recipes/{}", self.slug))
    }
}
