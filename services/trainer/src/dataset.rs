//! The fixed training catalog.
//!
//! Most items are trap questions that language models answer wrong when they
//! pattern-match instead of reading carefully. Labels are free-form strings
//! ("함정" marks a trap) so the catalog is not limited to the three dialogue
//! difficulties.

/// One labeled quiz task.
#[derive(Debug, Clone)]
pub struct QuizTask {
    pub question: &'static str,
    pub expected_answer: &'static str,
    pub difficulty: &'static str,
    pub subject: &'static str,
}

const fn task(
    question: &'static str,
    expected_answer: &'static str,
    difficulty: &'static str,
    subject: &'static str,
) -> QuizTask {
    QuizTask {
        question,
        expected_answer,
        difficulty,
        subject,
    }
}

/// The full catalog, in a fixed order. The train/validation partition is a
/// prefix/suffix split of this order, so reordering items changes the split.
pub fn create_dataset() -> Vec<QuizTask> {
    vec![
        // 기준선 (쉬움)
        task("5 + 10은?", "15", "쉬움", "수학"),
        task("물의 화학식은?", "H2O", "쉬움", "과학"),
        // 수학 함정
        task(
            "1달러짜리 공과 방망이의 총 가격은 1.10달러입니다. 방망이가 공보다 1달러 더 비쌉니다. 공의 가격은 몇 달러인가요?",
            "0.05",
            "함정",
            "수학",
        ),
        task("30을 2로 나누고 10을 더하면?", "25", "함정", "수학"),
        task("8을 반으로 나누면?", "4", "함정", "수학"),
        // 언어/논리 함정
        task(
            "철수의 아버지에게는 아들이 셋 있습니다. 첫째는 '월요일', 둘째는 '화요일'입니다. 셋째의 이름은?",
            "철수",
            "함정",
            "언어",
        ),
        task(
            "에밀리의 어머니에게는 딸이 4명 있습니다: 봄, 여름, 가을. 넷째 딸의 이름은?",
            "에밀리",
            "함정",
            "언어",
        ),
        task("1월과 2월 중에서 28일이 있는 달은 몇 개인가요?", "2", "함정", "논리"),
        // 패턴 인식 함정
        task(
            "버스 기사가 출발할 때 승객 10명이 있었습니다. 첫 정류장에서 3명이 내리고 5명이 탔습니다. 버스 기사의 나이는 몇 살인가요?",
            "알 수 없다",
            "함정",
            "논리",
        ),
        task(
            "릴리 패드가 연못을 덮는 데 48일이 걸립니다. 매일 2배로 자랍니다. 연못의 절반을 덮는 데 며칠이 걸리나요?",
            "47",
            "함정",
            "논리",
        ),
        // 상식 역이용
        task("모세가 방주에 각 동물을 몇 쌍씩 태웠나요?", "0", "함정", "상식"),
        task(
            "피자 한 판을 8조각으로 자르려면 최소 몇 번 칼질해야 하나요?",
            "4",
            "함정",
            "논리",
        ),
        // 계산 함정
        task(
            "사과 5개가 있습니다. 2개를 가져가면 몇 개를 갖게 되나요?",
            "2",
            "함정",
            "논리",
        ),
        task(
            "시계가 3시를 칠 때 3초가 걸립니다. 6시를 치는 데 몇 초가 걸리나요?",
            "5",
            "함정",
            "논리",
        ),
        // 기준선 (보통)
        task("대한민국의 수도는?", "서울", "쉬움", "일반상식"),
        task("7 × 8은?", "56", "쉬움", "수학"),
        task("훈민정음을 창제한 왕은?", "세종대왕", "보통", "역사"),
        task("지구에서 가장 큰 바다는?", "태평양", "보통", "지리"),
        task("'사과'를 영어로 하면?", "apple", "쉬움", "영어"),
        task("빛은 소리보다 빠른가요? (예/아니오)", "예", "보통", "과학"),
        // 추가 함정
        task(
            "100에서 7을 몇 번 빼면 2가 되나요?",
            "14",
            "함정",
            "수학",
        ),
        task("1년 중 28일이 있는 달은 몇 개인가요?", "12", "함정", "논리"),
        task(
            "농부에게 양이 17마리 있었는데 9마리 빼고 모두 죽었습니다. 몇 마리가 남았나요?",
            "9",
            "함정",
            "논리",
        ),
        task("1분 30초는 몇 초인가요?", "90", "함정", "수학"),
        task(
            "깃털 1kg과 철 1kg 중 어느 쪽이 더 무겁나요?",
            "같다",
            "함정",
            "논리",
        ),
        task(
            "달리기 경주에서 2등을 추월하면 몇 등인가요?",
            "2",
            "함정",
            "논리",
        ),
    ]
}

/// Partitions the catalog 80/20 into train/validation, order-preserving.
pub fn split_dataset(dataset: Vec<QuizTask>) -> (Vec<QuizTask>, Vec<QuizTask>) {
    let split = (dataset.len() as f64 * 0.8) as usize;
    let mut train = dataset;
    let validation = train.split_off(split);
    (train, validation)
}
