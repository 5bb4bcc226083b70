//! Page styles.

/// Styles for a rendered recipe.
pub const RECIPE_STYLES: &str = r#"
.layout { max-width: 1200px; margin: 0 auto; padding: 0 20px; font-family: sans-serif; color: #333; }
.banner img { display: block; max-width: 100%; height: auto; }
h2, h3 { text-transform: uppercase; }
.banner h2 {
    margin: 0;
    background: #fff;
    display: inline-block;
    padding: 20px;
    position: relative;
    top: -60px;
    left: -10px;
    transform: rotateZ(-1deg);
    box-shadow: 1px 3px 5px rgba(0, 0, 0, 0.1);
}
.info p { margin: 0; }
.method blockquote { border-left: 4px solid #eee; margin-left: 0; padding-left: 16px; }
.method table { border-collapse: collapse; }
.method td, .method th { border: 1px solid #ddd; padding: 4px 8px; }
"#;

/// Styles for the loading placeholder.
pub const SKELETON_STYLES: &str = r#"
.layout { max-width: 1200px; margin: 0 auto; padding: 0 20px; }
.skeleton { max-width: 1200px; margin: 20px auto; }
.skeleton > div { background: #cfcfcf; border-radius: 4px; margin: 20px 0; }
.s-banner { padding: 12% 0; }
.s-header { padding: 15px 0; max-width: 500px; }
.s-content { padding: 8px 0; max-width: 1000px; }
"#;
