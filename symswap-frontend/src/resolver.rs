use std::env;

use symswap_config::ReplaceConfig;
use symswap_engine::replace::ReplaceOptions;
use symswap_engine::scene::Scene;
use tracing::debug;

use crate::errors::FrontendError;

/// 模态对话框向用户展示的上下文：选中数量与符号名列表（按注册顺序）。
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub selection_len: usize,
    pub symbols: Vec<String>,
}

impl PromptContext {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            selection_len: scene.selection_len(),
            symbols: scene
                .document()
                .symbols()
                .map(|symbol| symbol.name.clone())
                .collect(),
        }
    }
}

/// 选项解析边界。真实宿主里这是一个同步的模态对话框；
/// 返回 `Ok(None)` 表示用户取消，整个操作中止且文档零变更。
pub trait OptionsResolver {
    fn resolve(&self, context: &PromptContext) -> Result<Option<ReplaceOptions>, FrontendError>;
}

/// 非交互解析器：环境变量 `SYMSWAP_SYMBOL` / `SYMSWAP_DELETE` 优先，
/// 其次是配置默认值，符号都未指定时取符号库中的第一个。
#[derive(Debug, Clone)]
pub struct ScriptedResolver {
    default_symbol: Option<String>,
    delete_originals: bool,
}

impl ScriptedResolver {
    pub fn new(default_symbol: Option<String>, delete_originals: bool) -> Self {
        Self {
            default_symbol,
            delete_originals,
        }
    }

    pub fn from_config(config: &ReplaceConfig) -> Self {
        Self::new(config.default_symbol.clone(), config.delete_originals)
    }
}

impl OptionsResolver for ScriptedResolver {
    fn resolve(&self, context: &PromptContext) -> Result<Option<ReplaceOptions>, FrontendError> {
        let delete_originals = match env::var("SYMSWAP_DELETE") {
            Ok(value) => matches!(value.as_str(), "1" | "true" | "yes"),
            Err(_) => self.delete_originals,
        };
        let requested = env::var("SYMSWAP_SYMBOL")
            .ok()
            .or_else(|| self.default_symbol.clone());

        let symbol = match requested {
            Some(name) => {
                if !context.symbols.iter().any(|candidate| candidate == &name) {
                    return Err(FrontendError::UnknownSymbol(name));
                }
                name
            }
            None => match context.symbols.first() {
                Some(first) => first.clone(),
                None => return Err(FrontendError::NoSymbols),
            },
        };

        debug!(symbol = %symbol, delete_originals, "解析得到替换选项");
        Ok(Some(ReplaceOptions::new(symbol, delete_originals)))
    }
}

/// 始终取消的解析器，供测试与演练使用。
#[derive(Debug, Clone, Copy)]
pub struct CancelResolver;

impl OptionsResolver for CancelResolver {
    fn resolve(&self, _context: &PromptContext) -> Result<Option<ReplaceOptions>, FrontendError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(symbols: &[&str]) -> PromptContext {
        PromptContext {
            selection_len: 2,
            symbols: symbols.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn configured_symbol_is_used_when_registered() {
        let resolver = ScriptedResolver::new(Some("Pin".to_string()), true);
        let options = resolver
            .resolve(&context(&["Badge", "Pin"]))
            .expect("resolve")
            .expect("not cancelled");
        assert_eq!(options.symbol, "Pin");
        assert!(options.delete_originals);
    }

    #[test]
    fn falls_back_to_first_registered_symbol() {
        let resolver = ScriptedResolver::new(None, false);
        let options = resolver
            .resolve(&context(&["Badge", "Pin"]))
            .expect("resolve")
            .expect("not cancelled");
        assert_eq!(options.symbol, "Badge");
        assert!(!options.delete_originals);
    }

    #[test]
    fn unknown_configured_symbol_is_an_error() {
        let resolver = ScriptedResolver::new(Some("Ghost".to_string()), false);
        let err = resolver.resolve(&context(&["Badge"])).unwrap_err();
        assert!(matches!(err, FrontendError::UnknownSymbol(_)));
    }

    #[test]
    fn empty_symbol_list_is_an_error() {
        let resolver = ScriptedResolver::new(None, false);
        let err = resolver.resolve(&context(&[])).unwrap_err();
        assert!(matches!(err, FrontendError::NoSymbols));
    }

    #[test]
    fn cancel_resolver_returns_none() {
        let result = CancelResolver
            .resolve(&context(&["Badge"]))
            .expect("no error");
        assert!(result.is_none());
    }
}
