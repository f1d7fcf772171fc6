use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use symswap_core::document::Document;
use symswap_engine::scene::{DemoNodes, Scene};
use thiserror::Error;
use tracing::{info, warn};

/// 文档来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Json(PathBuf),
    Demo,
}

/// 统一封装加载后的场景与元信息。
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: Scene,
    pub source: DocumentSource,
    pub demo_nodes: Option<DemoNodes>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("读取文档文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析文档文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 从环境变量 `SYMSWAP_SAMPLE_DOC` 指定的路径加载 JSON 文档，
/// 若未设置或加载失败则回退到内置示例。
/// 加载后把全部节点纳入选中集，模拟宿主的“当前选区”。
pub fn load_scene_from_env_or_demo() -> LoadedScene {
    if let Some(path) = env::var_os("SYMSWAP_SAMPLE_DOC") {
        let path = PathBuf::from(path);
        match load_document(&path) {
            Ok(document) => {
                info!(path = %path.display(), "从 JSON 加载文档成功");
                let mut scene = Scene::with_document(document);
                select_all(&mut scene);
                return LoadedScene {
                    scene,
                    source: DocumentSource::Json(path),
                    demo_nodes: None,
                };
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载 JSON 失败，回退到内置示例");
            }
        }
    }

    let mut scene = Scene::new();
    let demo_nodes = scene.populate_demo();
    // 与手工操作一致：选中全部标记（含锁定项，引擎会跳过它）。
    for id in [demo_nodes.plain, demo_nodes.wide, demo_nodes.locked] {
        let _ = scene.select(id);
    }

    LoadedScene {
        scene,
        source: DocumentSource::Demo,
        demo_nodes: Some(demo_nodes),
    }
}

pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn select_all(scene: &mut Scene) {
    let ids: Vec<_> = scene.document().nodes().map(|(id, _)| *id).collect();
    for id in ids {
        let _ = scene.select(id);
    }
}
