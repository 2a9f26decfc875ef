//! Demo tools registered by `augmented chat`.

use async_trait::async_trait;
use augmented_core::{FieldSpec, ToolDeclaration};
use augmented_engine::Session;
use augmented_tools::{handler_fn, required_arg, Tool, ToolArgs, ToolError, ToolHandler};
use chrono::Local;

pub struct CurrentTime;

#[async_trait]
impl ToolHandler for CurrentTime {
    async fn call(&self, _args: ToolArgs) -> Result<String, ToolError> {
        Ok(Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl Tool for CurrentTime {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new("current_time", "Returns the current local date and time")
    }
}

pub fn add_declaration() -> ToolDeclaration {
    ToolDeclaration::new("add", "Add two integers")
        .field("a", FieldSpec::required("integer").describe("First operand"))
        .field("b", FieldSpec::required("integer").describe("Second operand"))
}

pub fn register_demo_tools(session: &mut Session) {
    session.register(
        add_declaration(),
        handler_fn(|args| {
            let a: i64 = required_arg(&args, "a")?;
            let b: i64 = required_arg(&args, "b")?;
            a.checked_add(b)
                .map(|sum| sum.to_string())
                .ok_or_else(|| ToolError::failed("integer overflow"))
        }),
    );
    session.register_tool(CurrentTime);
}
