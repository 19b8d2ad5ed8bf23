/*!
 * Provider resolution
 *
 * Discovers a privileged kernel artifact by filename convention, smoke-tests
 * the provider it loads, and falls back to the deterministic provider on any
 * failure. Resolution selects a provider; it never fails the process.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::Result;
use crate::provider::{FallbackProvider, MetricProvider, ProviderKind};

/// Filename stem of the privileged kernel artifact
pub const KERNEL_STEM: &str = "emergence_kernel";

/// Platform extensions accepted for the kernel artifact
const KERNEL_EXTENSIONS: &[&str] = &["so", "dylib", "dll", "wasm"];

const DEFAULT_SMOKE_TIMEOUT: Duration = Duration::from_millis(500);

/// Look for `emergence_kernel.<ext>` in the given directory
///
/// Absence is not an error; it just means the fallback provider runs.
pub fn find_kernel_artifact(dir: &Path) -> Option<PathBuf> {
    KERNEL_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", KERNEL_STEM, ext)))
        .find(|candidate| candidate.is_file())
}

/// Callback that turns a discovered kernel artifact into a provider
///
/// Registered by the embedding application; how the artifact is actually
/// bound (FFI, wasm runtime, subprocess) is its business. A loader error is
/// a resolution failure, handled by falling back.
pub type ProviderLoader =
    Box<dyn FnOnce(&Path) -> Result<Box<dyn MetricProvider>> + Send>;

/// Outcome of provider resolution
pub struct Resolution {
    /// The selected provider
    pub provider: Box<dyn MetricProvider>,

    /// Which implementation was selected
    pub kind: ProviderKind,

    /// Why the privileged provider was not selected, if it wasn't
    pub fallback_reason: Option<String>,
}

/// Discovers, validates, and selects the metric provider
pub struct ProviderResolver {
    search_dir: PathBuf,
    loader: Option<ProviderLoader>,
    smoke_timeout: Duration,
    fallback_seed: u64,
}

impl ProviderResolver {
    /// Create a resolver searching `search_dir` for the kernel artifact
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: search_dir.into(),
            loader: None,
            smoke_timeout: DEFAULT_SMOKE_TIMEOUT,
            fallback_seed: 42,
        }
    }

    /// Register the loader used when a kernel artifact is found
    pub fn with_loader(mut self, loader: ProviderLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Override the smoke-test budget
    pub fn with_smoke_timeout(mut self, timeout: Duration) -> Self {
        self.smoke_timeout = timeout;
        self
    }

    /// Seed used if resolution falls back
    pub fn with_fallback_seed(mut self, seed: u64) -> Self {
        self.fallback_seed = seed;
        self
    }

    /// Select the provider
    ///
    /// Infallible by design: the worst outcome is the fallback provider
    /// with a recorded reason. Absence or malfunction of the privileged
    /// kernel must never prevent monitoring from running.
    pub async fn resolve(self) -> Resolution {
        let Self {
            search_dir,
            loader,
            smoke_timeout,
            fallback_seed,
        } = self;

        let reason = match try_privileged(&search_dir, loader, smoke_timeout).await {
            Ok(provider) => {
                info!("Loaded privileged kernel provider");
                return Resolution {
                    provider,
                    kind: ProviderKind::Privileged,
                    fallback_reason: None,
                };
            }
            Err(reason) => reason,
        };

        warn!("Privileged kernel not usable ({reason}); using fallback provider");
        Resolution {
            provider: Box::new(FallbackProvider::from_seed(fallback_seed)),
            kind: ProviderKind::Fallback,
            fallback_reason: Some(reason),
        }
    }
}

async fn try_privileged(
    search_dir: &Path,
    loader: Option<ProviderLoader>,
    smoke_timeout: Duration,
) -> std::result::Result<Box<dyn MetricProvider>, String> {
    let artifact = find_kernel_artifact(search_dir).ok_or_else(|| {
        format!(
            "no {}.{{{}}} in {}",
            KERNEL_STEM,
            KERNEL_EXTENSIONS.join("|"),
            search_dir.display()
        )
    })?;

    let loader =
        loader.ok_or_else(|| format!("{} present but no loader registered", artifact.display()))?;

    let mut provider =
        loader(&artifact).map_err(|e| format!("loader failed for {}: {}", artifact.display(), e))?;

    // Smoke test: one bounded call that must return finite floats in [0, 1]
    match tokio::time::timeout(smoke_timeout, provider.sample()).await {
        Err(_) => Err(format!("smoke test exceeded {:?} budget", smoke_timeout)),
        Ok(Err(e)) => Err(format!("smoke test call failed: {e}")),
        Ok(Ok((kappa, epsilon))) => {
            if in_unit_range(kappa) && in_unit_range(epsilon) {
                Ok(provider)
            } else {
                Err(format!(
                    "smoke test returned out-of-contract pair ({kappa}, {epsilon})"
                ))
            }
        }
    }
}

fn in_unit_range(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct ConstantProvider {
        kappa: f64,
        epsilon: f64,
    }

    #[async_trait]
    impl MetricProvider for ConstantProvider {
        async fn sample(&mut self) -> Result<(f64, f64)> {
            Ok((self.kappa, self.epsilon))
        }
    }

    struct StuckProvider;

    #[async_trait]
    impl MetricProvider for StuckProvider {
        async fn sample(&mut self) -> Result<(f64, f64)> {
            // Never completes within any smoke budget
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok((0.0, 0.0))
        }
    }

    fn write_artifact(dir: &Path) -> PathBuf {
        let path = dir.join("emergence_kernel.so");
        std::fs::write(&path, b"not a real shared object").unwrap();
        path
    }

    #[test]
    fn test_find_kernel_artifact() {
        let dir = tempdir().unwrap();
        assert!(find_kernel_artifact(dir.path()).is_none());

        let path = write_artifact(dir.path());
        assert_eq!(find_kernel_artifact(dir.path()), Some(path));
    }

    #[tokio::test]
    async fn test_no_artifact_falls_back() {
        let dir = tempdir().unwrap();
        let resolution = ProviderResolver::new(dir.path()).resolve().await;

        assert_eq!(resolution.kind, ProviderKind::Fallback);
        assert!(resolution.fallback_reason.unwrap().contains("no emergence_kernel"));
    }

    #[tokio::test]
    async fn test_artifact_without_loader_falls_back() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path());

        let resolution = ProviderResolver::new(dir.path()).resolve().await;

        assert_eq!(resolution.kind, ProviderKind::Fallback);
        assert!(resolution
            .fallback_reason
            .unwrap()
            .contains("no loader registered"));
    }

    #[tokio::test]
    async fn test_loader_error_falls_back() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path());

        let resolution = ProviderResolver::new(dir.path())
            .with_loader(Box::new(|_| {
                Err(GuardError::ProviderResolution(
                    "unsupported binary format".to_string(),
                ))
            }))
            .resolve()
            .await;

        assert_eq!(resolution.kind, ProviderKind::Fallback);
        assert!(resolution.fallback_reason.unwrap().contains("loader failed"));
    }

    #[tokio::test]
    async fn test_out_of_contract_smoke_result_falls_back() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path());

        let resolution = ProviderResolver::new(dir.path())
            .with_loader(Box::new(|_| {
                Ok(Box::new(ConstantProvider {
                    kappa: 7.5,
                    epsilon: 0.2,
                }) as Box<dyn MetricProvider>)
            }))
            .resolve()
            .await;

        assert_eq!(resolution.kind, ProviderKind::Fallback);
        assert!(resolution
            .fallback_reason
            .unwrap()
            .contains("out-of-contract"));
    }

    #[tokio::test]
    async fn test_smoke_timeout_falls_back() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path());

        let resolution = ProviderResolver::new(dir.path())
            .with_smoke_timeout(Duration::from_millis(20))
            .with_loader(Box::new(|_| {
                Ok(Box::new(StuckProvider) as Box<dyn MetricProvider>)
            }))
            .resolve()
            .await;

        assert_eq!(resolution.kind, ProviderKind::Fallback);
        assert!(resolution.fallback_reason.unwrap().contains("budget"));
    }

    #[tokio::test]
    async fn test_valid_kernel_selected() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path());

        let mut resolution = ProviderResolver::new(dir.path())
            .with_loader(Box::new(|_| {
                Ok(Box::new(ConstantProvider {
                    kappa: 0.42,
                    epsilon: 0.17,
                }) as Box<dyn MetricProvider>)
            }))
            .resolve()
            .await;

        assert_eq!(resolution.kind, ProviderKind::Privileged);
        assert!(resolution.fallback_reason.is_none());
        assert_eq!(resolution.provider.sample().await.unwrap(), (0.42, 0.17));
    }
}
