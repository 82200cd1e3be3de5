//! MOTD 清洗：去除 Minecraft 旧版颜色/格式代码（`§` + `0-9a-fk-or`）。

const SECTION_SIGN: char = '§';

fn is_format_code(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

/// 去除所有 `§x` 代码，其余字符（含非 ASCII）原样保留。
///
/// 以栈的方式单遍处理：删除一对代码后重新拼接出的新代码（如 `§§aa`）也会被删除，
/// 因此输出中不会残留任何代码，且结果幂等。代码字母区分大小写（`§A` 不会被删除）。
pub fn sanitize_motd(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_format_code(c) && out.ends_with(SECTION_SIGN) {
            out.pop();
            continue;
        }
        out.push(c);
    }
    out
}
