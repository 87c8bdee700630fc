/// Include/exclude rules over document path prefixes
///
/// With include prefixes configured, a path must match one of them. When both an
/// include and an exclude prefix match, the longer one wins; equal lengths exclude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        let clean = |patterns: &[String]| -> Vec<String> {
            patterns
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            include: clean(include),
            exclude: clean(exclude),
        }
    }

    fn longest_match(patterns: &[String], path: &str) -> Option<usize> {
        patterns
            .iter()
            .filter(|p| path.starts_with(p.as_str()))
            .map(String::len)
            .max()
    }

    pub fn allows(&self, path: &str) -> bool {
        let included = Self::longest_match(&self.include, path);
        if !self.include.is_empty() && included.is_none() {
            return false;
        }
        match (included, Self::longest_match(&self.exclude, path)) {
            (Some(include), Some(exclude)) => include > exclude,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}
