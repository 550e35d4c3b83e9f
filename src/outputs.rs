use std::path::PathBuf;

use hcl::{Block, Body, Identifier, Traversal, Variable};
use rand::rngs::StdRng;
use tracing::info;

use crate::config::Config;
use crate::secrets::{self, FIELDS_KEY};
use crate::writer;

pub const LOCALS_FILE_NAME: &str = "locals.tf";
pub const MAIN_FILE_NAME: &str = "main.tf";

const RESOURCE_TYPE: &str = "ibm_container_ingress_secret_opaque";
const RESOURCE_NAME: &str = "ingress-secret";

const EACH: &str = "each";
// The dynamic block label doubles as its iterator name.
const FIELDS_ITERATOR: &str = FIELDS_KEY;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Write error ocurred: {0}.")]
    WriteError(#[from] writer::Error),
}

pub struct Generator {
    pub config: Config,

    rng: StdRng,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        let rng = config.random_source.rng();
        return Self { config, rng };
    }

    /// `locals { secrets = { ... } }` filled with freshly generated placeholders.
    pub fn locals_document(&mut self) -> Body {
        let mapping = secrets::generate(
            &mut self.rng,
            self.config.secret_count,
            self.config.field_count,
        );

        let locals = Block::builder("locals")
            .add_attribute((secrets::secrets_attribute(), mapping.to_expression()))
            .build();

        return Body::builder().add_block(locals).build();
    }

    /// The ingress secret resource, iterating over `local.secrets`.
    pub fn main_document(&self) -> Body {
        let each_key = iteration_property(EACH, "key");

        let content = Block::builder("content")
            .add_attribute(("field_name", iteration_property(FIELDS_ITERATOR, "key")))
            .add_attribute(("crn", iteration_property(FIELDS_ITERATOR, "value")))
            .build();

        let dynamic = Block::builder("dynamic")
            .add_label(FIELDS_ITERATOR)
            .add_attribute(("for_each", secrets::secret_fields_reference(each_key.clone())))
            .add_block(content)
            .build();

        let resource = Block::builder("resource")
            .add_label(RESOURCE_TYPE)
            .add_label(RESOURCE_NAME)
            .add_attribute(("for_each", secrets::secrets_reference()))
            .add_attribute(("cluster", self.config.cluster_id.clone()))
            .add_attribute(("secret_name", each_key))
            .add_attribute(("secret_namespace", self.config.namespace.clone()))
            .add_block(dynamic)
            .build();

        return Body::builder().add_block(resource).build();
    }

    pub fn generate_locals(&mut self) -> Result<PathBuf, Error> {
        writer::ensure_dir(&self.config.output_dir)?;
        let body = self.locals_document();
        let path = writer::write_body(&self.config.output_dir, LOCALS_FILE_NAME, &body)?;
        return Ok(path);
    }

    pub fn generate_main(&self) -> Result<PathBuf, Error> {
        writer::ensure_dir(&self.config.output_dir)?;
        let body = self.main_document();
        let path = writer::write_body(&self.config.output_dir, MAIN_FILE_NAME, &body)?;
        return Ok(path);
    }

    pub fn generate_outputs(&mut self) -> Result<(), Error> {
        let locals = self.generate_locals()?;
        let main = self.generate_main()?;

        info!(
            locals = %locals.display(),
            main = %main.display(),
            "generated terraform configuration"
        );
        return Ok(());
    }
}

// `<iterator>.<property>`, e.g. `each.key` or `fields.value`.
fn iteration_property(iterator: &str, property: &str) -> Traversal {
    return Traversal::builder(Variable::sanitized(iterator))
        .attr(Identifier::sanitized(property))
        .build();
}
