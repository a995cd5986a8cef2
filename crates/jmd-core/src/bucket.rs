use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build-tool dependency scope a declaration is added to.
///
/// Serialized with the host's configuration names (`implementation`, `testCompileOnly`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigurationBucket {
    Api,
    Implementation,
    CompileOnly,
    RuntimeOnly,
    TestImplementation,
    TestRuntimeOnly,
    TestCompileOnly,
    AnnotationProcessor,
}

impl ConfigurationBucket {
    pub const ALL: [ConfigurationBucket; 8] = [
        ConfigurationBucket::Api,
        ConfigurationBucket::Implementation,
        ConfigurationBucket::CompileOnly,
        ConfigurationBucket::RuntimeOnly,
        ConfigurationBucket::TestImplementation,
        ConfigurationBucket::TestRuntimeOnly,
        ConfigurationBucket::TestCompileOnly,
        ConfigurationBucket::AnnotationProcessor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigurationBucket::Api => "api",
            ConfigurationBucket::Implementation => "implementation",
            ConfigurationBucket::CompileOnly => "compileOnly",
            ConfigurationBucket::RuntimeOnly => "runtimeOnly",
            ConfigurationBucket::TestImplementation => "testImplementation",
            ConfigurationBucket::TestRuntimeOnly => "testRuntimeOnly",
            ConfigurationBucket::TestCompileOnly => "testCompileOnly",
            ConfigurationBucket::AnnotationProcessor => "annotationProcessor",
        }
    }

    /// The declaration context whose dependencies live in this bucket.
    ///
    /// `annotationProcessor` is shared by both contexts.
    pub fn context(self) -> Option<DeclarationContext> {
        match self {
            ConfigurationBucket::Api
            | ConfigurationBucket::Implementation
            | ConfigurationBucket::CompileOnly
            | ConfigurationBucket::RuntimeOnly => Some(DeclarationContext::Main),
            ConfigurationBucket::TestImplementation
            | ConfigurationBucket::TestRuntimeOnly
            | ConfigurationBucket::TestCompileOnly => Some(DeclarationContext::Test),
            ConfigurationBucket::AnnotationProcessor => None,
        }
    }

    /// Buckets that only contribute to the runtime classpath.
    pub fn is_runtime_only(self) -> bool {
        matches!(
            self,
            ConfigurationBucket::RuntimeOnly | ConfigurationBucket::TestRuntimeOnly
        )
    }
}

impl fmt::Display for ConfigurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigurationBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigurationBucket::ALL
            .into_iter()
            .find(|bucket| bucket.name() == s)
            .ok_or_else(|| format!("unknown configuration bucket `{s}`"))
    }
}

/// Whether a module declaration belongs to production code or to test code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationContext {
    #[default]
    Main,
    Test,
}

impl DeclarationContext {
    pub fn is_test(self) -> bool {
        self == DeclarationContext::Test
    }

    /// Names of the sibling configurations whose resolved versions must agree.
    pub fn sibling_classpaths(self) -> (&'static str, &'static str) {
        match self {
            DeclarationContext::Main => ("compileClasspath", "runtimeClasspath"),
            DeclarationContext::Test => ("testCompileClasspath", "testRuntimeClasspath"),
        }
    }
}
