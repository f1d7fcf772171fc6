use std::collections::HashMap;

use crate::replace::ReplaceOptions;
use crate::scene::Scene;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(ReplaceWithSymbolCommand);
        bus.register(ClearSelectionCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

/// `replace_with_symbol <符号名> [--delete]`：对当前选中集执行批量替换。
struct ReplaceWithSymbolCommand;

impl CommandHandler for ReplaceWithSymbolCommand {
    fn name(&self) -> &'static str {
        "replace_with_symbol"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let Some(symbol) = request
            .args
            .iter()
            .find(|arg| !arg.starts_with("--"))
            .cloned()
        else {
            return CommandResponse::err("replace_with_symbol 需要一个符号名参数");
        };
        let delete_originals = request.args.iter().any(|arg| arg == "--delete");

        let options = ReplaceOptions::new(symbol, delete_originals);
        match context.scene.replace_selection(&options) {
            Ok(report) => CommandResponse::ok(format!(
                "替换完成: 成功 {} 项, 跳过 {} 项, 失败 {} 项",
                report.replaced(),
                report.skipped(),
                report.failed()
            )),
            Err(err) => CommandResponse::err(format!("预检失败: {err}")),
        }
    }
}

struct ClearSelectionCommand;

impl CommandHandler for ClearSelectionCommand {
    fn name(&self) -> &'static str {
        "clear_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.clear_selection();
        CommandResponse::ok("选中集已清空")
    }
}
