//! Recipe page rendering.

use cookbook_sdk::cookbook_richtext::{escape_html, HtmlRenderer, RichTextError};
use cookbook_sdk::cookbook_shell::{HeadContent, Shell};

use crate::model::RecipeRenderModel;
use crate::styles::{RECIPE_STYLES, SKELETON_STYLES};

/// Longest meta description emitted, in characters.
const DESCRIPTION_CHARS: usize = 160;

/// Image URL usable from the page.
///
/// Protocol-relative URLs (`//host/path`) get an `https:` scheme; anything
/// else is used as stored.
pub fn image_src(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Ingredients as one inline run of `<span>` items. Each item carries its
/// separator: `, ` after every item but the last, which ends with `.`.
///
/// `None` for an empty list.
pub fn ingredient_items(ingredients: &[String]) -> Option<String> {
    let (last, rest) = ingredients.split_last()?;
    let mut html: String = rest
        .iter()
        .map(|item| format!("<span>{}, </span>", escape_html(item)))
        .collect();
    html.push_str(&format!("<span>{}.</span>", escape_html(last)));
    Some(html)
}

/// Render the body of a recipe page.
pub fn render_recipe(
    recipe: &RecipeRenderModel,
    rich_text: &HtmlRenderer,
) -> Result<String, RichTextError> {
    let method = rich_text.render(&recipe.method)?;
    let image = &recipe.featured_image;

    let ingredients = ingredient_items(&recipe.ingredients)
        .map(|items| format!(r#"<p class="ingredients">{}</p>"#, items))
        .unwrap_or_default();

    Ok(format!(
        r#"<div class="recipe" data-slug="{slug}">
    <div class="banner">
        <img src="{src}" width="{width}" height="{height}" alt="{alt}">
        <h2>{title}</h2>
    </div>
    <div class="info">
        <p>Takes about {cooking_time} mins to cook.</p>
        <h3>Ingredients:</h3>
        {ingredients}
    </div>
    <div class="method">
        <h3>Method:</h3>
        <div>{method}</div>
    </div>
</div>"#,
        slug = escape_html(&recipe.slug),
        src = escape_html(&image_src(&image.url)),
        width = image.width,
        height = image.height,
        alt = escape_html(image.title.as_deref().unwrap_or(&recipe.title)),
        title = escape_html(&recipe.title),
        cooking_time = recipe.cooking_time,
        ingredients = ingredients,
        method = method,
    ))
}

/// Render the loading placeholder body.
pub fn render_skeleton() -> String {
    r#"<div class="skeleton" aria-busy="true">
    <div class="s-banner"></div>
    <div class="s-header"></div>
    <div class="s-content"></div>
    <div class="s-content"></div>
    <div class="s-content"></div>
</div>"#
        .to_string()
}

fn description(recipe: &RecipeRenderModel) -> String {
    let text = recipe.method.plain_text();
    if text.chars().count() <= DESCRIPTION_CHARS {
        return text;
    }
    let mut short: String = text.chars().take(DESCRIPTION_CHARS - 3).collect();
    short.push_str("...");
    short
}

/// Builds full page documents.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    site_name: String,
}

impl PageTemplate {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Document for a recipe, or the placeholder when there is none.
    pub fn render(
        &self,
        recipe: Option<&RecipeRenderModel>,
        rich_text: &HtmlRenderer,
    ) -> Result<String, RichTextError> {
        match recipe {
            Some(recipe) => self.render_recipe(recipe, rich_text),
            None => Ok(self.render_placeholder()),
        }
    }

    /// Document for a recipe.
    pub fn render_recipe(
        &self,
        recipe: &RecipeRenderModel,
        rich_text: &HtmlRenderer,
    ) -> Result<String, RichTextError> {
        let body = render_recipe(recipe, rich_text)?;
        let mut head = HeadContent::new(format!("{} | {}", recipe.title, self.site_name));
        let description = description(recipe);
        if !description.is_empty() {
            head = head.with_meta("description", &description);
        }
        let shell = Shell::new(head.with_style(RECIPE_STYLES));
        Ok(shell.render(&body))
    }

    /// Document shown while a page is being built or has no recipe.
    pub fn render_placeholder(&self) -> String {
        let head = HeadContent::new(format!("Loading… | {}", self.site_name))
            .with_style(SKELETON_STYLES);
        Shell::new(head).render(&render_skeleton())
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self::new("Cookbook")
    }
}
