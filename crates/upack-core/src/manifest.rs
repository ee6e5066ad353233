//! Android manifest rendering using Handlebars.
//!
//! The manifest is rendered once per run into a byte buffer and then written
//! into every target. Templates see two values:
//!
//! - `entry_activity`: fully qualified name of the launcher activity
//! - `permissions`: list of permission names, iterated with `{{#each}}`
//!
//! Templates are compiled in strict mode, so a reference to any other field
//! is a render error instead of an empty string.

use crate::Error;
use crate::Result;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Name under which the template is registered.
const TEMPLATE_NAME: &str = "manifest";

/// Built-in Unity player manifest.
pub const DEFAULT_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest
    xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.unity3d.player"
    android:installLocation="preferExternal"
    android:versionCode="1"
    android:versionName="1.0">
    <supports-screens
        android:smallScreens="true"
        android:normalScreens="true"
        android:largeScreens="true"
        android:xlargeScreens="true"
        android:anyDensity="true"/>
{{#each permissions}}
    <uses-permission android:name="{{this}}" />
{{/each}}

    <application
        android:theme="@style/UnityThemeSelector"
        android:icon="@drawable/app_icon"
        android:label="@string/app_name"
        android:debuggable="true">
        <activity android:name="{{entry_activity}}"
                  android:label="@string/app_name">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
            <meta-data android:name="unityplayer.UnityActivity" android:value="true" />
        </activity>
    </application>
</manifest>
"#;

/// Data bound into the manifest template.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestModel<'a> {
    /// Fully qualified launcher activity.
    pub entry_activity: &'a str,

    /// Permissions, rendered in order.
    pub permissions: &'a [String],
}

/// Compiled manifest template.
///
/// # Examples
///
/// ```
/// use upack_core::manifest::ManifestModel;
/// use upack_core::manifest::ManifestRenderer;
///
/// let renderer = ManifestRenderer::load(None)?;
/// let permissions = vec!["android.permission.INTERNET".to_string()];
/// let bytes = renderer.render(&ManifestModel {
///     entry_activity: "com.example.MainActivity",
///     permissions: &permissions,
/// })?;
///
/// let text = String::from_utf8(bytes).unwrap();
/// assert!(text.contains("com.example.MainActivity"));
/// assert!(text.contains("android.permission.INTERNET"));
/// # Ok::<(), upack_core::Error>(())
/// ```
#[derive(Debug)]
pub struct ManifestRenderer {
    registry: Handlebars<'static>,
    name: String,
}

impl ManifestRenderer {
    /// Loads the built-in template, or the template file at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::TemplateLoadFailed`] if the file cannot be read,
    /// [`Error::TemplateParseFailed`] if the template is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Self::from_source("default", DEFAULT_TEMPLATE),
            Some(path) => {
                let source =
                    std::fs::read_to_string(path).map_err(|source| Error::TemplateLoadFailed {
                        path: path.to_path_buf(),
                        source,
                    })?;
                debug!(path = %path.display(), "loaded manifest template");
                Self::from_source(&path.display().to_string(), &source)
            }
        }
    }

    /// Compiles a template from source text.
    ///
    /// `name` only appears in error messages.
    ///
    /// # Errors
    ///
    /// [`Error::TemplateParseFailed`] if the template is invalid.
    pub fn from_source(name: &str, source: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| Error::TemplateParseFailed {
                name: name.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            registry,
            name: name.to_string(),
        })
    }

    /// Returns the template name used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the manifest.
    ///
    /// # Errors
    ///
    /// [`Error::TemplateRenderFailed`] if rendering fails, for example when
    /// the template references a field the model does not have.
    pub fn render(&self, model: &ManifestModel<'_>) -> Result<Vec<u8>> {
        let rendered = self
            .registry
            .render(TEMPLATE_NAME, model)
            .map_err(|e| Error::TemplateRenderFailed {
                name: self.name.clone(),
                source: Box::new(e),
            })?;
        Ok(rendered.into_bytes())
    }
}
