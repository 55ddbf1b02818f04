//! # Cache de Modelos
//!
//! Carregar um pipeline é caro comparado a processar um texto curto, então cada
//! combinação de argumentos é carregada uma única vez e reutilizada.
//!
//! A chave é a concatenação dos argumentos de carga (ex: `"en_core_web_smtruefalse"`).
//! O mapa de chaves fica sob um `Mutex` só o tempo de achar o slot da chave.
//! A carga acontece sob a trava de carga do slot: requisições simultâneas para a
//! mesma chave esperam a mesma carga em vez de carregar de novo, e chaves
//! diferentes carregam em paralelo. O modelo pronto fica num `OnceLock`, lido
//! sem trava. Uma carga que falha não é guardada e a próxima requisição tenta
//! outra vez.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::{Language, ModelLoader, PipelineConfig};

#[derive(Default)]
struct Slot {
    language: OnceLock<Arc<Language>>,
    /// serializa as cargas da mesma chave
    loading: Mutex<()>,
}

/// Cache de pipelines carregados, sem expiração.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    entries: Mutex<HashMap<String, Arc<Slot>>>,
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Chave de cache para os argumentos de carga
    pub fn key(model: &str, coref: bool, constituents: bool) -> String {
        format!("{}{}{}", model, coref, constituents)
    }

    /// Devolve o pipeline da chave, carregando-o na primeira vez.
    pub fn get_or_load(&self, model: &str, coref: bool, constituents: bool) -> Result<Arc<Language>> {
        let key = Self::key(model, coref, constituents);
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        if let Some(language) = slot.language.get() {
            debug!(%key, "modelo em cache");
            return Ok(Arc::clone(language));
        }

        let _loading = slot.loading.lock().unwrap_or_else(PoisonError::into_inner);
        // outra requisição pode ter terminado a carga enquanto esperávamos
        if let Some(language) = slot.language.get() {
            return Ok(Arc::clone(language));
        }

        info!(%key, "carregando modelo");
        let config = PipelineConfig::new(model, coref, constituents);
        let language = Arc::new(self.loader.load(&config)?);
        Ok(Arc::clone(slot.language.get_or_init(|| language)))
    }

    /// Quantidade de modelos já carregados
    pub fn len(&self) -> usize {
        self.slots().iter().filter(|slot| slot.language.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indica se a chave já tem um modelo carregado
    pub fn contains(&self, model: &str, coref: bool, constituents: bool) -> bool {
        let key = Self::key(model, coref, constituents);
        let slot = {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.get(&key).cloned()
        };
        slot.is_some_and(|slot| slot.language.get().is_some())
    }

    fn slots(&self) -> Vec<Arc<Slot>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache").field("loaded", &self.len()).finish()
    }
}
