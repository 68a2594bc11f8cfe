use crate::config::Config;
use crate::generator::compose::{PapersCorpus, SectionComposer, SectionWriteResult, catalog};
use crate::generator::context::GeneratorContext;
use crate::generator::research::{OutlineResearch, research_corpus};
use crate::generator::types::Generator;

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations.push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按结束顺序排列的阶段耗时
    pub fn phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const RESEARCH_ALL: &'static str = "research_all";
    pub const WRITING: &'static str = "writing";
    pub const ASSEMBLY: &'static str = "assembly";
    pub const SEARCH: &'static str = "search";
}

/// 撰写模式
#[derive(Debug, Clone, PartialEq)]
pub enum WriteMode {
    Single(String),
    Batch(Vec<String>),
    /// 标准的 11 个章节
    All,
    /// 只根据已有片段生成 main.tex
    AssembleOnly,
}

/// 一次命令行调用要完成的工作
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Research {
        outline: PathBuf,
        subject: String,
    },
    ResearchAll {
        subject: String,
    },
    Write {
        papers: PathBuf,
        mode: WriteMode,
        generate_main: bool,
    },
    Search {
        query: String,
        limit: Option<usize>,
    },
}

/// 按配置创建服务并执行任务。返回 false 表示部分单元失败（需要非零退出码）
pub async fn launch(config: &Config, job: Job) -> Result<bool> {
    let context = GeneratorContext::new(config.clone())?;
    run(&context, job).await
}

/// 在给定上下文中执行任务；输入文件缺失等致命错误以 Err 返回
pub async fn run(context: &GeneratorContext, job: Job) -> Result<bool> {
    let mut timing = TimingScope::new();

    let success = match job {
        Job::Research { outline, subject } => {
            let research = OutlineResearch::new(outline, subject);
            timing.start_phase(research.stage());
            let result = research.execute(context.clone()).await?;
            timing.end_phase(research.stage());

            tracing::info!(
                "📊 共 {} 篇不重复文献 (原始 {} 篇, 去除重复 {} 篇)",
                result.summary.total_unique_papers,
                result.summary.total_mentions,
                result.summary.deduplication_stats.papers_removed
            );
            true
        }
        Job::ResearchAll { subject } => {
            timing.start_phase(TimingKeys::RESEARCH_ALL);
            let outcome = research_corpus(context, &subject).await?;
            timing.end_phase(TimingKeys::RESEARCH_ALL);

            tracing::info!(
                "📊 大纲处理完成: 成功 {}, 失败 {}",
                outcome.succeeded.len(),
                outcome.failed.len()
            );
            if let Some(path) = &outcome.combined_path {
                tracing::info!("💾 合并结果: {}", path.display());
            }
            outcome.is_success()
        }
        Job::Write {
            papers,
            mode,
            generate_main,
        } => {
            let corpus = PapersCorpus::load(&papers)?;
            let composer = SectionComposer::new(context);

            match mode {
                WriteMode::AssembleOnly => {
                    timing.start_phase(TimingKeys::ASSEMBLY);
                    let path = composer.assemble_main(&corpus.drug_name)?;
                    timing.end_phase(TimingKeys::ASSEMBLY);
                    println!("✅ 主文档已生成: {}", path.display());
                    println!(
                        "   编译: cd {} && pdflatex main.tex && pdflatex main.tex",
                        composer.outlet().output_dir().display()
                    );
                    true
                }
                WriteMode::Single(section_id) => {
                    timing.start_phase(TimingKeys::WRITING);
                    let result = composer
                        .write_single(&corpus, &section_id, generate_main)
                        .await?;
                    timing.end_phase(TimingKeys::WRITING);
                    result.is_success()
                }
                WriteMode::Batch(sections) => {
                    write_batch(&composer, &corpus, &sections, generate_main, &mut timing).await?
                }
                WriteMode::All => {
                    let sections = catalog::standard_sections();
                    write_batch(&composer, &corpus, &sections, generate_main, &mut timing).await?
                }
            }
        }
        Job::Search { query, limit } => {
            let limit = limit.unwrap_or(context.config.search.default_match_limit);
            timing.start_phase(TimingKeys::SEARCH);
            let papers = context.searcher.search(&query, limit).await?;
            timing.end_phase(TimingKeys::SEARCH);

            println!("🔍 {} 条结果 ({}): {}", papers.len(), context.searcher.name(), query);
            for (idx, paper) in papers.iter().enumerate() {
                println!("[{}] {}", idx + 1, paper.title);
                println!("    {}", paper.url);
                if let (Some(journal), Some(year)) = (&paper.journal, &paper.year) {
                    println!("    {} ({})", journal, year);
                }
            }
            true
        }
    };

    tracing::info!("⏱️ {}", timing.generate_timing_report());
    Ok(success)
}

async fn write_batch(
    composer: &SectionComposer<'_>,
    corpus: &PapersCorpus,
    sections: &[String],
    generate_main: bool,
    timing: &mut TimingScope,
) -> Result<bool> {
    timing.start_phase(TimingKeys::WRITING);
    let report = composer.write_batch(corpus, sections, generate_main).await?;
    timing.end_phase(TimingKeys::WRITING);

    for (section_id, result) in &report.results {
        match result {
            SectionWriteResult::Success {
                length,
                quality_score,
                ..
            } => println!("   ✅ {}: {} chars, score: {:.1}", section_id, length, quality_score),
            SectionWriteResult::Failed { error } => {
                println!("   ❌ {}: {}", section_id, error)
            }
        }
    }
    if let Some(path) = &report.main_document {
        println!("✅ 主文档已生成: {}", path.display());
    }
    Ok(report.is_success())
}

#[cfg(test)]
mod tests;
