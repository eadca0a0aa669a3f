//! pytest module rendering

use crate::features::test_generation::domain::{ExpectedBehavior, TestCase, TestSuite};
use std::fmt::Write;

const HEADER: &str = "# Generated by codegraph-symbolic\nimport pytest\n";

/// `def f(a, b):` with a body that refuses to run
fn stub(suite: &TestSuite) -> String {
    format!(
        "def {}({}):\n    raise NotImplementedError(\"source for {} was not available\")",
        suite.function,
        suite.params.join(", "),
        suite.function
    )
}

fn call(case: &TestCase) -> String {
    let args = case
        .inputs
        .iter()
        .map(|i| format!("{}={}", i.name, i.value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", case.function, args)
}

fn docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

fn render_case(out: &mut String, case: &TestCase) -> std::fmt::Result {
    writeln!(out, "def {}():", case.name)?;
    writeln!(out, "    \"\"\"{}\"\"\"", docstring(&case.description))?;
    match (&case.expected_behavior, &case.expected_return) {
        (ExpectedBehavior::Raises { exception }, _) => {
            writeln!(out, "    with pytest.raises({}):", exception)?;
            writeln!(out, "        {}", call(case))?;
        }
        (ExpectedBehavior::Returns { value }, _) => {
            writeln!(out, "    result = {}", call(case))?;
            writeln!(out, "    assert result is {}", if *value { "True" } else { "False" })?;
        }
        (_, Some(value)) => {
            writeln!(out, "    result = {}", call(case))?;
            writeln!(out, "    assert result == {}", value)?;
        }
        (ExpectedBehavior::ExercisesPath { .. }, None) => {
            writeln!(out, "    {}", call(case))?;
        }
    }
    Ok(())
}

impl TestSuite {
    /// Function source (or a stub) followed by one test per case
    pub fn render_module(&self) -> String {
        let mut out = String::from(HEADER);
        out.push_str("\n\n");
        match self.function_source.as_deref().map(str::trim_end) {
            Some(source) if !source.is_empty() => {
                // re-root methods and nested definitions at column zero
                let min_indent = source
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| l.len() - l.trim_start().len())
                    .min()
                    .unwrap_or(0);
                let body = source
                    .lines()
                    .map(|l| l.get(min_indent..).unwrap_or_else(|| l.trim_start()))
                    .collect::<Vec<_>>()
                    .join("\n");
                out.push_str(&body);
            }
            _ => out.push_str(&stub(self)),
        }
        out.push('\n');
        for case in &self.test_cases {
            out.push_str("\n\n");
            // writing into a String cannot fail
            let _ = render_case(&mut out, case);
        }
        out
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_generation::domain::{SkipStats, TestInput};
    use crate::shared::NativeValue;

    fn case(behavior: ExpectedBehavior, expected: Option<NativeValue>) -> TestCase {
        TestCase {
            name: "test_f_path_0".into(),
            function: "f".into(),
            path_id: 0,
            inputs: vec![TestInput {
                name: "x".into(),
                value: NativeValue::Int(11),
            }],
            expected_behavior: behavior,
            expected_return: expected,
            description: "Path 0: x > 10".into(),
            warnings: vec![],
            replay_verified: None,
        }
    }

    fn suite(source: Option<&str>, cases: Vec<TestCase>) -> TestSuite {
        TestSuite {
            function: "f".into(),
            params: vec!["x".into()],
            test_cases: cases,
            skipped: SkipStats::default(),
            function_source: source.map(String::from),
            budget_exceeded: false,
        }
    }

    #[test]
    fn test_renders_return_assertion() {
        let s = suite(
            Some("def f(x):\n    return 'high'"),
            vec![case(
                ExpectedBehavior::ExercisesPath {
                    path_id: 0,
                    condition_count: 1,
                },
                Some(NativeValue::Str("high".into())),
            )],
        );
        let module = s.render_module();
        assert!(module.contains("def f(x):\n    return 'high'"));
        assert!(module.contains("def test_f_path_0():"));
        assert!(module.contains("    result = f(x=11)\n    assert result == 'high'"));
    }

    #[test]
    fn test_renders_raises() {
        let s = suite(
            Some("def f(x):\n    raise ValueError()"),
            vec![case(
                ExpectedBehavior::Raises {
                    exception: "ValueError".into(),
                },
                None,
            )],
        );
        assert!(s
            .render_module()
            .contains("    with pytest.raises(ValueError):\n        f(x=11)"));
    }

    #[test]
    fn test_missing_source_renders_stub() {
        let s = suite(None, vec![]);
        let module = s.render_module();
        assert!(module.contains("def f(x):\n    raise NotImplementedError("));
    }

    #[test]
    fn test_indented_method_source_is_dedented() {
        let s = suite(Some("    def f(x):\n        return x"), vec![]);
        assert!(s.render_module().contains("\ndef f(x):\n    return x"));
    }
}
