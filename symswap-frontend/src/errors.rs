use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("当前没有选中任何图形，请先选中要替换的标记")]
    EmptySelection,
    #[error("文档中没有注册符号，请先创建符号后再运行")]
    NoSymbols,
    #[error("符号 {0:?} 未在文档中注册")]
    UnknownSymbol(String),
    #[error("命令执行失败: {0}")]
    Command(String),
}
