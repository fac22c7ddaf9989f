//! Rendering of the HTML form page.

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use zeroshot_core::config::InterfaceConfig;
use zeroshot_core::Example;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Example entry as the template and the examples API see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleView {
    pub index: usize,
    pub labels: String,
    pub image_url: String,
}

impl From<&Example> for ExampleView {
    fn from(example: &Example) -> Self {
        Self {
            index: example.index,
            labels: example.labels.clone(),
            image_url: format!("/examples/{}/image", example.index),
        }
    }
}

/// Pre-compiled page template.
pub struct Page {
    env: Environment<'static>,
}

impl Page {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the form page.
    pub fn render(
        &self,
        interface: &InterfaceConfig,
        examples: &[Example],
    ) -> Result<String, minijinja::Error> {
        let examples: Vec<ExampleView> = examples.iter().map(ExampleView::from).collect();
        self.env.get_template("index.html")?.render(context! {
            title => &interface.title,
            description => &interface.description,
            article => &interface.article,
            num_top_classes => interface.num_top_classes,
            examples => examples,
            version => zeroshot_core::VERSION,
        })
    }
}
