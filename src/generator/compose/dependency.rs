//! 章节依赖图与拓扑排序

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// 章节编号 -> 前置章节编号。
/// 词汇表固定，正常情况下是 DAG；出现环或悬空引用时尽力排序并告警。
#[derive(Debug, Clone, Default)]
pub struct SectionDependencyGraph {
    prerequisites: BTreeMap<String, Vec<String>>,
}

impl SectionDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 2.5 各章节的依赖关系
    pub fn standard() -> Self {
        let mut graph = Self::new();
        for (sid, deps) in [
            ("2.5", &[][..]),
            ("2.5.1", &[][..]),
            ("2.5.2", &["2.5.1"][..]),
            ("2.5.3", &["2.5.2"][..]),
            ("2.5.4", &["2.5.3"][..]),
            ("2.5.5", &["2.5.3", "2.5.4"][..]),
            ("2.5.6", &["2.5.4", "2.5.5"][..]),
            ("2.5.6.1", &["2.5.1", "2.5.6"][..]),
            ("2.5.6.1.1", &["2.5.6.1"][..]),
            ("2.5.6.1.2", &["2.5.6.1"][..]),
            ("2.5.6.2", &["2.5.4", "2.5.6"][..]),
            ("2.5.6.3", &["2.5.5", "2.5.6"][..]),
            ("2.5.6.4", &["2.5.4", "2.5.5", "2.5.6.2", "2.5.6.3", "2.5.6"][..]),
            ("2.5.7", &[][..]),
        ] {
            graph = graph.with(sid, deps);
        }
        graph
    }

    pub fn with(mut self, section_id: &str, prerequisites: &[&str]) -> Self {
        self.prerequisites.insert(
            section_id.to_string(),
            prerequisites.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn prerequisites(&self, section_id: &str) -> &[String] {
        self.prerequisites
            .get(section_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Kahn 算法排序。
    ///
    /// 只考虑两端都在输入中的依赖边；每一步从入度为 0 的集合中取字典序最小者。
    /// 无法排出的章节（环）按输入顺序追加到末尾。重复的输入只保留第一次。
    pub fn order(&self, sections: &[String]) -> Vec<String> {
        let mut input: Vec<&str> = Vec::with_capacity(sections.len());
        for sid in sections {
            if !input.contains(&sid.as_str()) {
                input.push(sid);
            }
        }
        let members: BTreeSet<&str> = input.iter().copied().collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for &sid in &input {
            let deps: BTreeSet<&str> = self
                .prerequisites(sid)
                .iter()
                .map(String::as_str)
                .filter(|dep| members.contains(dep) && *dep != sid)
                .collect();
            in_degree.insert(sid, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(sid);
            }
        }

        let mut ready: BTreeSet<&str> = input
            .iter()
            .copied()
            .filter(|sid| in_degree[sid] == 0)
            .collect();
        let mut ordered: Vec<String> = Vec::with_capacity(input.len());

        while let Some(sid) = ready.pop_first() {
            ordered.push(sid.to_string());
            for &dependent in dependents.get(sid).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if ordered.len() < input.len() {
            let remaining: Vec<String> = input
                .iter()
                .filter(|sid| !ordered.iter().any(|o| o == *sid))
                .map(|sid| sid.to_string())
                .collect();
            tracing::warn!(
                "⚠️ 章节依赖存在环或无法满足，追加到末尾: {}",
                remaining.join(", ")
            );
            ordered.extend(remaining);
        }

        ordered
    }
}
