//! Prompts and fixed labels for roadmap generation.
//!
//! Every piece of text sent to a model lives here so prompt changes touch
//! exactly one file, and tests can inspect prompts without a live model.
//!
//! The prompts, template and process labels are Chinese because the roadmap
//! layout (two subgraphs named `研究过程` / `研究内容`) comes from Chinese
//! academic convention, and the model answers in the prompt's language.

/// The six generic research-process steps.
///
/// Identical for every document and never taken from model output.
pub const PROCESS_STEPS: [&str; 6] = [
    "泛读文献确定选题",
    "精读文献分类梳理",
    "理论分析与研究假设",
    "模型设定与数据选择",
    "实证分析",
    "结论建议",
];

/// Process-track nodes used when the prompt builder receives no process steps.
pub const DEFAULT_PROCESS_NODES: [&str; 7] = [
    "研究问题",
    "泛读文献 确定选题",
    "精读文献 分类筛选",
    "理论分析 研究假设",
    "模型设定 数据选择",
    "实证分析",
    "结论建议",
];

/// First node letter of the process track.
pub const PROCESS_START_LETTER: char = 'A';

/// First node letter of the content track.
///
/// Fixed offset: more than seven process steps collide with this letter.
pub const CONTENT_START_LETTER: char = 'H';

/// System prompt for step extraction.
///
/// Only `content_steps` is requested; process steps are filled in by code.
pub const STEP_EXTRACTION_PROMPT: &str = "你是科研技术路线图专家。请只从下面的论文内容中提取“研究内容”部分的关键步骤，\
包括但不限于引言（理论综述与理论基础），理论分析与研究假设，模型设定与数据选择，实证结构与分析，结论与建议这几部分。\
按自上而下的顺序输出。请只返回 JSON，格式如下：
{
  \"content_steps\": [\"步骤1\", \"步骤2\", ...]
}
不要返回任何 process_steps，也不要添加多余的解释。";

/// Build the user message carrying the paper text.
pub fn step_extraction_user_message(text: &str) -> String {
    format!("论文内容：\n{}", text)
}

/// Mermaid template the diagram prompt asks the model to imitate.
pub const DIAGRAM_TEMPLATE: &str = r#"
graph TD
    subgraph 研究过程
        A[研究问题] --> B[泛读文献<br>确定选题]
        B --> C[精读文献<br>分类筛选]
        C --> D{理论分析<br>研究假设}
        D --> E[模型设定<br>数据选择]
        E --> F[实证分析]
        F --> G[结论建议]
    end

    subgraph 研究内容
        H[论文标题] --> I[引言]
        I --> J(理论综述)
        I --> K(理论基础)
        J & K --> L{理论分析<br>研究假设}
        L --> L1[信息优化机制]
        L --> L2[风险改善机制]
        L --> L3[创新驱动机制]
        L1 & L2 & L3 --> M[模型设定<br>与数据选择]
        M --> N{实证结构<br>与分析}
        N --> O1[描述性统计]
        N --> O2[相关性分析]
        N --> O3[实证分析]
        N --> O4[稳健性检验]
        O1 & O2 & O3 & O4 --> P[结论建议]
    end
"#;

/// Instruction header of the diagram prompt: role plus the six rules.
pub const DIAGRAM_RULES: &str = "你是一位具备结构分析能力的学术图谱绘制专家，现在需要你仿照下方 Mermaid 示例模板，\
生成符合当前研究内容的 Mermaid 图代码。请严格按照以下约定进行操作：
1. 模板中的【研究内容】分支结构由 content_steps 填充，请依次替换；
2. 文本根据语义换行，推荐使用 <br> 作为换行标记；
3. 保证研究过程与研究内容流程节点数量大致对齐；
4. 所有连接线为直线或直角折线，禁止使用曲线；
5. 禁止更改 subgraph 名称与主结构框架；
6. 仅返回 Mermaid 代码块（不要输出解释说明）。";

/// Node letter for the `index`-th (0-based) label of a track starting at `start`.
///
/// Past `Z` this keeps counting through the following code points.
pub fn node_letter(start: char, index: usize) -> char {
    u32::try_from(index)
        .ok()
        .and_then(|i| (start as u32).checked_add(i))
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Letter-keyed mapping lines (`A: label`) for both tracks.
///
/// An empty `process_steps` falls back to [`DEFAULT_PROCESS_NODES`].
pub fn node_mapping<S: AsRef<str>, P: AsRef<str>>(
    content_steps: &[S],
    process_steps: &[P],
) -> Vec<String> {
    let mut lines = Vec::with_capacity(content_steps.len() + process_steps.len().max(7));

    if process_steps.is_empty() {
        for (i, label) in DEFAULT_PROCESS_NODES.iter().enumerate() {
            lines.push(format!("{}: {}", node_letter(PROCESS_START_LETTER, i), label));
        }
    } else {
        for (i, label) in process_steps.iter().enumerate() {
            lines.push(format!(
                "{}: {}",
                node_letter(PROCESS_START_LETTER, i),
                label.as_ref()
            ));
        }
    }

    for (i, label) in content_steps.iter().enumerate() {
        lines.push(format!(
            "{}: {}",
            node_letter(CONTENT_START_LETTER, i),
            label.as_ref()
        ));
    }

    lines
}

/// Build the single instruction string for the diagram-description call.
///
/// Layout: rules, the template verbatim, then the node mapping.
pub fn build_diagram_prompt<S: AsRef<str>, P: AsRef<str>>(
    content_steps: &[S],
    process_steps: &[P],
) -> String {
    format!(
        "{}\n\n这是 Mermaid 模板：\n{}\n\n以下是当前节点映射关系：\n{}",
        DIAGRAM_RULES,
        DIAGRAM_TEMPLATE.trim(),
        node_mapping(content_steps, process_steps).join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_steps_are_six_fixed_labels() {
        assert_eq!(PROCESS_STEPS.len(), 6);
        assert_eq!(PROCESS_STEPS[0], "泛读文献确定选题");
        assert_eq!(PROCESS_STEPS[5], "结论建议");
    }

    #[test]
    fn mapping_uses_fixed_offsets() {
        let content = ["引言", "理论分析"];
        let lines = node_mapping(&content, &PROCESS_STEPS);
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "A: 泛读文献确定选题");
        assert_eq!(lines[5], "F: 结论建议");
        assert_eq!(lines[6], "H: 引言");
        assert_eq!(lines[7], "I: 理论分析");
        // G is left to the template's own process node.
        assert!(!lines.iter().any(|l| l.starts_with("G:")));
    }

    #[test]
    fn empty_process_steps_fall_back_to_default_nodes() {
        let lines = node_mapping(&["引言"], &[] as &[&str]);
        assert_eq!(lines[0], "A: 研究问题");
        assert_eq!(lines[6], "G: 结论建议");
        assert_eq!(lines[7], "H: 引言");
    }

    #[test]
    fn long_process_list_collides_with_content_letters() {
        let process: Vec<String> = (0..8).map(|i| format!("p{i}")).collect();
        let lines = node_mapping(&["c0"], &process);
        assert_eq!(lines[7], "H: p7");
        assert_eq!(lines[8], "H: c0");
    }

    #[test]
    fn letters_run_past_z_without_panicking() {
        assert_eq!(node_letter('H', 18), 'Z');
        assert_eq!(node_letter('H', 19), '[');
        assert_eq!(node_letter('A', usize::MAX), char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn prompt_embeds_template_and_mapping() {
        let prompt = build_diagram_prompt(&["文献综述"], &PROCESS_STEPS);
        assert!(prompt.contains(DIAGRAM_TEMPLATE.trim()));
        assert!(prompt.contains("subgraph 研究过程"));
        assert!(prompt.contains("禁止使用曲线"));
        assert!(prompt.contains("<br>"));
        assert!(prompt.ends_with("H: 文献综述"));
    }

    #[test]
    fn user_message_carries_text() {
        assert_eq!(step_extraction_user_message("abc"), "论文内容：\nabc");
        assert!(STEP_EXTRACTION_PROMPT.contains("content_steps"));
    }
}
